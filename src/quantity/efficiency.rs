quantity!(MilesPerKilowattHour, via: f64, suffix: "mi/kWh", precision: 2);
