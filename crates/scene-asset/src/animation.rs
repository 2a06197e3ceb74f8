use std::ops::{Add, Mul};

use glam::{Quat, Vec4};

use crate::node::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Linear,
    Step,
    CubicSpline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelPath {
    Translation,
    Rotation,
    Scale,
}

/// Keyframe track.
///
/// `outputs` keeps the raw output components packed, `stride` per value (and
/// `3 * stride` per keyframe for cubic splines, laid out as in-tangent,
/// value, out-tangent). `outputs_vec4` holds the same values padded to four
/// components.
#[derive(Debug, Clone)]
pub struct AnimationSampler {
    pub interpolation: Interpolation,
    pub inputs: Vec<f32>,
    pub outputs: Vec<f32>,
    pub outputs_vec4: Vec<Vec4>,
    pub stride: usize,
}

#[derive(Debug, Clone)]
pub struct AnimationChannel {
    pub path: ChannelPath,
    pub node: NodeId,
    pub sampler: usize,
}

#[derive(Debug, Clone)]
pub struct Animation {
    pub name: String,
    pub samplers: Vec<AnimationSampler>,
    pub channels: Vec<AnimationChannel>,
    pub start: f32,
    pub end: f32,
}

impl Animation {
    pub fn duration(&self) -> f32 {
        (self.end - self.start).max(0.0)
    }
}

pub trait Interpolate {
    fn linear(a: Self, b: Self, t: f32) -> Self;
    fn cubic_spline(vk: Self, bk: Self, vk_1: Self, ak_1: Self, t: f32, td: f32) -> Self;
}

impl<T> Interpolate for T
where
    T: Mul<T, Output = T> + Mul<f32, Output = T> + Add<T, Output = T>,
{
    fn linear(a: Self, b: Self, t: f32) -> Self {
        a * (1.0 - t) + b * t
    }

    fn cubic_spline(vk: Self, bk: Self, vk_1: Self, ak_1: Self, t: f32, td: f32) -> Self {
        let t3 = t.powi(3);
        let t2 = t.powi(2);
        let first = vk * (2.0 * t3 - 3.0 * t2 + 1.0);
        let second = bk * (td * (t3 - 2.0 * t2 + t));
        let third = vk_1 * (-2.0 * t3 + 3.0 * t2);
        let forth = ak_1 * (td * (t3 - t2));
        first + second + third + forth
    }
}

/// Spherical interpolation between two rotations.
///
/// With `shortest_path` unset the keyframes are used as authored, so two
/// keyframes with opposite signs rotate the long way round.
pub fn slerp(a: Quat, b: Quat, t: f32, shortest_path: bool) -> Quat {
    let mut dot = a.dot(b);
    let b = if shortest_path && dot < 0.0 {
        dot = -dot;
        -b
    } else {
        b
    };

    if dot > 0.9995 {
        return Quat::from_vec4(Vec4::linear(Vec4::from(a), Vec4::from(b), t)).normalize();
    }

    let theta = dot.clamp(-1.0, 1.0).acos();
    // Unit quaternion orthogonal to `a` in the plane of `a` and `b`. For
    // opposite keyframes every great circle through `a` reaches `b`, pick a
    // fixed one.
    let perpendicular = Vec4::from(b) - Vec4::from(a) * dot;
    let perpendicular = if perpendicular.length() > 1e-3 {
        Quat::from_vec4(perpendicular.normalize())
    } else {
        Quat::from_xyzw(-a.y, a.x, -a.w, a.z)
    };
    let angle = t * theta;
    (a * angle.cos() + perpendicular * angle.sin()).normalize()
}

impl AnimationSampler {
    /// Keyframe pair bracketing `time` and the local parameter between them.
    ///
    /// Returns `None` when `time` lies outside the track. For a track with a
    /// single keyframe only its own time matches.
    pub fn bracket(&self, time: f32) -> Option<(usize, f32)> {
        let last = self.inputs.len().checked_sub(1)?;
        if last == 0 {
            return (time == self.inputs[0]).then_some((0, 0.0));
        }
        if !(self.inputs[0] <= time && time <= self.inputs[last]) {
            return None;
        }

        let index = self
            .inputs
            .partition_point(|input| *input <= time)
            .saturating_sub(1)
            .min(last - 1);
        let delta = self.inputs[index + 1] - self.inputs[index];
        let progress = if delta > 0.0 {
            ((time - self.inputs[index]).max(0.0) / delta).min(1.0)
        } else {
            1.0
        };
        Some((index, progress))
    }

    /// Keyframe value `keyframe`, padded to four components.
    pub fn value(&self, keyframe: usize) -> Vec4 {
        let index = match self.interpolation {
            Interpolation::CubicSpline => keyframe * 3 + 1,
            _ => keyframe,
        };
        self.outputs_vec4.get(index).copied().unwrap_or(Vec4::ZERO)
    }

    // part: 0 in-tangent, 1 value, 2 out-tangent
    fn spline_component(&self, keyframe: usize, part: usize) -> Vec4 {
        let start = (keyframe * 3 + part) * self.stride;
        let mut result = [0.0; 4];
        for (component, value) in result.iter_mut().enumerate().take(self.stride.min(4)) {
            *value = self.outputs.get(start + component).copied().unwrap_or(0.0);
        }
        Vec4::from_array(result)
    }

    fn cubic_spline(&self, index: usize, progress: f32) -> Vec4 {
        let delta = self.inputs[index + 1] - self.inputs[index];
        Vec4::cubic_spline(
            self.spline_component(index, 1),
            self.spline_component(index, 2),
            self.spline_component(index + 1, 1),
            self.spline_component(index + 1, 0),
            progress,
            delta,
        )
    }

    /// Sample the track at `time`.
    ///
    /// Rotation tracks are interpolated spherically and normalized; exact
    /// keyframe times return the keyframe value untouched.
    pub fn sample(&self, time: f32, rotation: bool, shortest_path: bool) -> Option<Vec4> {
        let (index, progress) = self.bracket(time)?;
        if self.inputs.len() == 1 {
            return Some(self.value(0));
        }

        let value = match self.interpolation {
            Interpolation::Step => {
                if progress >= 1.0 {
                    self.value(index + 1)
                } else {
                    self.value(index)
                }
            }
            _ if progress <= 0.0 => self.value(index),
            _ if progress >= 1.0 => self.value(index + 1),
            Interpolation::Linear => {
                let (current, next) = (self.value(index), self.value(index + 1));
                if rotation {
                    Vec4::from(slerp(
                        Quat::from_vec4(current),
                        Quat::from_vec4(next),
                        progress,
                        shortest_path,
                    ))
                } else {
                    Vec4::linear(current, next, progress)
                }
            }
            Interpolation::CubicSpline => {
                let value = self.cubic_spline(index, progress);
                if rotation {
                    Vec4::from(Quat::from_vec4(value).normalize())
                } else {
                    value
                }
            }
        };
        Some(value)
    }
}

#[cfg(test)]
mod test {
    use glam::Vec3;

    use super::*;

    fn sampler(interpolation: Interpolation, inputs: &[f32], values: &[[f32; 3]]) -> AnimationSampler {
        AnimationSampler {
            interpolation,
            inputs: inputs.to_vec(),
            outputs: values.iter().flatten().copied().collect(),
            outputs_vec4: values
                .iter()
                .map(|value| Vec3::from_array(*value).extend(0.0))
                .collect(),
            stride: 3,
        }
    }

    #[test]
    fn test_boundaries_are_exact() {
        let track = sampler(
            Interpolation::Linear,
            &[0.25, 1.0, 2.0],
            &[[0.1, 0.2, 0.3], [7.0, 8.0, 9.0], [-1.3, 2.7, 0.9]],
        );
        assert_eq!(
            track.sample(0.25, false, false),
            Some(Vec4::new(0.1, 0.2, 0.3, 0.0))
        );
        assert_eq!(
            track.sample(2.0, false, false),
            Some(Vec4::new(-1.3, 2.7, 0.9, 0.0))
        );
    }

    #[test]
    fn test_outside_of_track_is_not_sampled() {
        let track = sampler(Interpolation::Linear, &[1.0, 2.0], &[[0.0; 3], [1.0; 3]]);
        assert_eq!(track.sample(0.5, false, false), None);
        assert_eq!(track.sample(2.5, false, false), None);
    }

    #[test]
    fn test_linear_blends() {
        let track = sampler(Interpolation::Linear, &[0.0, 2.0], &[[0.0; 3], [4.0, 8.0, -2.0]]);
        let value = track.sample(0.5, false, false).unwrap();
        assert!((value - Vec4::new(1.0, 2.0, -0.5, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_step_never_blends() {
        let track = sampler(
            Interpolation::Step,
            &[0.0, 1.0, 2.0],
            &[[1.0; 3], [2.0; 3], [3.0; 3]],
        );
        for step in 0..=40 {
            let time = step as f32 * 0.05;
            let value = track.sample(time, false, false).unwrap();
            assert!(
                [1.0, 2.0, 3.0].contains(&value.x),
                "blended value {} at {}",
                value.x,
                time
            );
        }
        assert_eq!(track.sample(0.99, false, false).unwrap().x, 1.0);
        assert_eq!(track.sample(1.0, false, false).unwrap().x, 2.0);
        assert_eq!(track.sample(2.0, false, false).unwrap().x, 3.0);
    }

    #[test]
    fn test_cubic_spline_uses_value_of_triplet() {
        // in-tangent, value, out-tangent per keyframe
        let track = sampler(
            Interpolation::CubicSpline,
            &[0.0, 1.0],
            &[
                [9.0, 9.0, 9.0],
                [0.0, 0.0, 0.0],
                [0.0, 0.0, 0.0],
                [0.0, 0.0, 0.0],
                [2.0, 4.0, 6.0],
                [9.0, 9.0, 9.0],
            ],
        );
        assert_eq!(track.sample(0.0, false, false), Some(Vec4::ZERO));
        assert_eq!(
            track.sample(1.0, false, false),
            Some(Vec4::new(2.0, 4.0, 6.0, 0.0))
        );
        // zero tangents reduce to smoothstep between the values
        let middle = track.sample(0.5, false, false).unwrap();
        assert!((middle - Vec4::new(1.0, 2.0, 3.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_cubic_spline_tangents_are_scaled_by_interval() {
        let track = sampler(
            Interpolation::CubicSpline,
            &[0.0, 2.0],
            &[
                [0.0; 3],
                [0.0; 3],
                [1.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [2.0, 0.0, 0.0],
                [0.0; 3],
            ],
        );
        // a straight line with slope 1 is reproduced exactly
        let value = track.sample(0.5, false, false).unwrap();
        assert!((value.x - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_slerp_without_sign_correction_takes_long_way() {
        let a = Quat::IDENTITY;
        let b = -Quat::from_rotation_y(0.2);
        let authored = slerp(a, b, 0.5, false);
        let shortest = slerp(a, b, 0.5, true);
        let expected = Quat::from_rotation_y(0.1);
        assert!(shortest.dot(expected).abs() > 0.9999);
        assert!(authored.dot(expected).abs() < 0.9);
    }

    #[test]
    fn test_slerp_between_opposite_keyframes() {
        let q = Quat::from_rotation_x(0.7);
        for t in [0.25, 0.5, 0.75] {
            let value = slerp(q, -q, t, false);
            assert!(value.is_finite(), "{} at {}", value, t);
            assert!(value.is_normalized());
        }
        assert!(slerp(q, -q, 0.0, false).dot(q) > 0.9999);
        assert!(slerp(q, -q, 1.0, false).dot(-q) > 0.9999);
        assert!(slerp(Quat::IDENTITY, -Quat::IDENTITY, 0.5, false).is_finite());
    }

    #[test]
    fn test_slerp_between_nearly_opposite_keyframes() {
        let b = -Quat::from_rotation_y(0.02);
        let theta = Quat::IDENTITY.dot(b).acos();
        let value = slerp(Quat::IDENTITY, b, 0.25, false);
        assert!((value.dot(Quat::IDENTITY) - (0.25 * theta).cos()).abs() < 1e-4);
        assert!(value.y < -0.7);
        // with sign correction the pair is two close rotations
        let shortest = slerp(Quat::IDENTITY, b, 0.25, true);
        assert!(shortest.dot(Quat::from_rotation_y(0.005)).abs() > 0.9999);
    }

    #[test]
    fn test_linear_rotation_track_with_flipped_sign() {
        let q = Quat::from_rotation_z(1.2);
        let track = AnimationSampler {
            interpolation: Interpolation::Linear,
            inputs: vec![0.0, 1.0],
            outputs: Vec4::from(q).to_array().into_iter().chain(Vec4::from(-q).to_array()).collect(),
            outputs_vec4: vec![Vec4::from(q), Vec4::from(-q)],
            stride: 4,
        };
        let value = track.sample(0.5, true, false).unwrap();
        assert!(value.is_finite());
        assert!((value.length() - 1.0).abs() < 1e-5);
        assert_eq!(track.sample(1.0, true, false), Some(Vec4::from(-q)));
    }

    #[test]
    fn test_single_keyframe_track() {
        let track = sampler(Interpolation::Linear, &[0.5], &[[3.0; 3]]);
        assert_eq!(track.sample(0.5, false, false), Some(Vec4::new(3.0, 3.0, 3.0, 0.0)));
        assert_eq!(track.sample(0.6, false, false), None);
    }
}
