use std::ops::{Div, Mul};

use crate::quantity::{
    distance::Miles,
    efficiency::MilesPerKilowattHour,
    percent::Percent,
    power::Kilowatts,
    time::Minutes,
};

quantity!(KilowattHours, via: f64, suffix: "kWh", precision: 1);

impl Mul<Percent> for KilowattHours {
    type Output = Self;

    fn mul(self, percent: Percent) -> Self::Output {
        self * percent.to_ratio()
    }
}

impl Mul<MilesPerKilowattHour> for KilowattHours {
    type Output = Miles;

    fn mul(self, efficiency: MilesPerKilowattHour) -> Self::Output {
        Miles(self.0 * efficiency.0)
    }
}

impl Div<Kilowatts> for KilowattHours {
    type Output = Minutes;

    fn div(self, power: Kilowatts) -> Self::Output {
        Minutes(self.0 / power.0 * 60.0)
    }
}
