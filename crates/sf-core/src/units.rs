// sf-core/src/units.rs

use uom::si::f64::{
    Length as UomLength, MassRate as UomMassRate, Power as UomPower, Pressure as UomPressure,
};

// Public canonical unit types (SI, f64)
pub type Length = UomLength;
pub type MassRate = UomMassRate;
pub type Power = UomPower;
pub type Pressure = UomPressure;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn w(v: f64) -> Power {
    use uom::si::power::watt;
    Power::new::<watt>(v)
}

#[inline]
pub fn kgps(v: f64) -> MassRate {
    use uom::si::mass_rate::kilogram_per_second;
    MassRate::new::<kilogram_per_second>(v)
}

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}
