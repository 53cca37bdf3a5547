use std::ops::Div;

use crate::quantity::{efficiency::MilesPerKilowattHour, energy::KilowattHours};

quantity!(Miles, via: f64, suffix: "mi", precision: 1);

impl Miles {
    pub const fn from_meters(meters: f64) -> Self {
        Self(meters / 1609.344)
    }
}

impl Div<MilesPerKilowattHour> for Miles {
    type Output = KilowattHours;

    fn div(self, efficiency: MilesPerKilowattHour) -> Self::Output {
        KilowattHours(self.0 / efficiency.0)
    }
}
