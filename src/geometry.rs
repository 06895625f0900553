//! # Hand Geometry
//!
//! Pure mapping from a [`TimeSample`] to hand rotations and endpoints.
//!
//! Angles are in degrees, clockwise from 12 o'clock, matching [`Canvas::rotate`]:
//! - seconds sweep with the milliseconds: `(s + ms/1000) · 6`
//! - minutes step once per minute: `m · 6`
//! - hours sweep with the minutes: `h · 30 + m / 2`
//!
//! [`Canvas::rotate`]: crate::canvas::Canvas::rotate

use serde::Serialize;

use crate::canvas::PointF;
use crate::time::TimeSample;

/// Distance of each hand's marker from the center, as a fraction of the radius.
pub const LUMP_ORBIT: f32 = 0.9;

/// Marker radius as a fraction of the face radius.
pub const LUMP_RADIUS: f32 = 0.1;

/// Rotation of each hand in degrees, clockwise from 12 o'clock.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct HandAngles {
    pub hours: f32,
    pub minutes: f32,
    pub seconds: f32,
}

impl HandAngles {
    pub fn from_sample(sample: &TimeSample) -> Self {
        Self {
            hours: f32::from(sample.hour12) * 30.0 + f32::from(sample.minute) / 2.0,
            minutes: f32::from(sample.minute) * 6.0,
            seconds: sample.seconds() * 6.0,
        }
    }
}

/// Hand lengths cached per surface size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct HandLengths {
    pub hour: f32,
    pub minute: f32,
    pub second: f32,
}

impl HandLengths {
    pub fn for_radius(radius: f32) -> Self {
        Self {
            hour: radius * 0.5,
            minute: radius * 0.75,
            second: radius * 0.875,
        }
    }
}

/// Screen point `length` away from `center` along `angle` (degrees clockwise from 12).
pub fn endpoint(angle: f32, length: f32, center: PointF) -> PointF {
    let (sin, cos) = angle.to_radians().sin_cos();
    PointF::new(center.x + length * sin, center.y - length * cos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn angles(h: u8, m: u8, s: u8, ms: u16) -> HandAngles {
        HandAngles::from_sample(&TimeSample::from_hms_milli(h, m, s, ms))
    }

    #[test]
    fn test_reference_time_angles() {
        let a = angles(3, 7, 45, 500);
        assert!((a.hours - 93.5).abs() < 1e-4);
        assert!((a.minutes - 42.0).abs() < 1e-4);
        assert!((a.seconds - 273.0).abs() < 1e-4);
    }

    #[test]
    fn test_seconds_angle_bounds() {
        assert_eq!(angles(0, 0, 0, 0).seconds, 0.0);
        assert!((angles(0, 0, 59, 999).seconds - 359.994).abs() < 1e-3);
    }

    #[test]
    fn test_hours_angle_in_range_and_monotonic() {
        let mut previous: Option<f32> = None;
        for hour in 0..12u8 {
            for minute in 0..60u8 {
                let angle = angles(hour, minute, 0, 0).hours;
                assert!((0.0..360.0).contains(&angle));
                if let Some(prev) = previous {
                    // Half a degree per minute, continuous across minute changes
                    assert!((angle - prev - 0.5_f32).abs() < 1e-4);
                }
                previous = Some(angle);
            }
        }
        // Wraps back to 0 after 11:59
        assert_eq!(angles(12, 0, 0, 0).hours, 0.0);
    }

    #[test]
    fn test_hand_lengths() {
        let lengths = HandLengths::for_radius(200.0);
        assert_eq!(lengths.second, 175.0);
        assert_eq!(lengths.minute, 150.0);
        assert_eq!(lengths.hour, 100.0);
    }

    #[test]
    fn test_endpoint_directions() {
        let center = PointF::new(100.0, 100.0);
        let twelve = endpoint(0.0, 50.0, center);
        assert!((twelve.x - 100.0).abs() < 1e-4 && (twelve.y - 50.0).abs() < 1e-4);
        let three = endpoint(90.0, 50.0, center);
        assert!((three.x - 150.0).abs() < 1e-4 && (three.y - 100.0).abs() < 1e-4);
        let six = endpoint(180.0, 50.0, center);
        assert!((six.y - 150.0).abs() < 1e-4);
    }
}
