#[macro_use]
pub mod macros;

pub mod distance;
pub mod efficiency;
pub mod energy;
pub mod percent;
pub mod power;
pub mod time;

#[cfg(test)]
mod tests {
    use super::{distance::Miles, percent::Percent};

    #[test]
    fn test_min() {
        assert_eq!(Miles(1.0).min(Miles(2.0)), Miles(1.0));
        assert_eq!(Miles(2.0).min(Miles(1.0)), Miles(1.0));
    }

    #[test]
    fn test_max() {
        assert_eq!(Miles(1.0).max(Miles(2.0)), Miles(2.0));
        assert_eq!(Miles(2.0).max(Miles(1.0)), Miles(2.0));
    }

    #[test]
    fn test_clamp() {
        assert_eq!(Percent(120.0).clamp(Percent::EMPTY, Percent::FULL), Percent::FULL);
        assert_eq!(Percent(-3.0).clamp(Percent::EMPTY, Percent::FULL), Percent::EMPTY);
    }

    #[test]
    fn test_display() {
        assert_eq!(Miles(12.345).to_string(), "12.3 mi");
        assert_eq!(format!("{:?}", Percent(-2.24)), "-2.2%");
    }
}
