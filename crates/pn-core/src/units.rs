// pn-core/src/units.rs

use uom::si::f64::{
    DynamicViscosity as UomDynamicViscosity, Pressure as UomPressure,
    VolumeRate as UomVolumeRate,
};

// Public canonical unit types (SI, f64)
pub type DynVisc = UomDynamicViscosity;
pub type Pressure = UomPressure;
pub type VolumeRate = UomVolumeRate;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn m3ps(v: f64) -> VolumeRate {
    use uom::si::volume_rate::cubic_meter_per_second;
    VolumeRate::new::<cubic_meter_per_second>(v)
}

#[inline]
pub fn pa_s(v: f64) -> DynVisc {
    use uom::si::dynamic_viscosity::pascal_second;
    DynVisc::new::<pascal_second>(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uom::si::pressure::pascal;

    #[test]
    fn constructors_round_trip() {
        assert_eq!(pa(101325.0).get::<pascal>(), 101325.0);
        assert_eq!(pa_s(1e-3).value, 1e-3);
        assert_eq!(m3ps(1e-10).value, 1e-10);
    }
}
