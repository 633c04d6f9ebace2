//! Temperature scale conversion.

/// Offset between Celsius and Kelvin.
pub const ABSOLUTE_ZERO_OFFSET: f64 = 273.15;

/// `celsius * 1.8 + 32`, evaluated as `* 9 / 5` so that readings such as
/// 28.5 land on the nearest double (83.3) instead of 83.30000000000001.
pub fn fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

pub fn kelvin(celsius: f64) -> f64 {
    celsius + ABSOLUTE_ZERO_OFFSET
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freezing_point() {
        assert_eq!(fahrenheit(0.0), 32.0);
        assert_eq!(kelvin(0.0), 273.15);
    }

    #[test]
    fn sample_reading() {
        assert_eq!(fahrenheit(28.5), 83.3);
        assert_eq!(kelvin(28.5), 301.65);
    }

    #[test]
    fn negative_reading() {
        assert_eq!(fahrenheit(-40.0), -40.0);
        assert!((kelvin(-273.15)).abs() < f64::EPSILON);
    }
}
