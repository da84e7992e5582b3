#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![doc = "A `no_std` pose type for discrete grid simulations."]
#![doc = ""]
#![doc = "This crate provides a grid pose with per-field change tracking, integer grid"]
#![doc = "points, and the distance metrics used by the path planner."]

use core::fmt;
use core::ops::{Add, Div, Mul, Sub};
use libm::{fabs, floor, round, sqrt};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Absolute tolerance used when comparing two poses.
pub const POSE_EPSILON: f64 = 1e-9;

/// Which fields of a [`Pose`] changed since the last [`Pose::reset_updates`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoseUpdates {
    /// `x` changed.
    pub x: bool,
    /// `y` changed.
    pub y: bool,
    /// `theta` changed.
    pub theta: bool,
    /// `w` changed.
    pub w: bool,
    /// `h` changed.
    pub h: bool,
}

impl PoseUpdates {
    /// Every field marked as changed.
    pub const ALL: PoseUpdates = PoseUpdates {
        x: true,
        y: true,
        theta: true,
        w: true,
        h: true,
    };

    /// No field marked as changed.
    pub const NONE: PoseUpdates = PoseUpdates {
        x: false,
        y: false,
        theta: false,
        w: false,
        h: false,
    };

    /// Returns `true` if at least one field changed.
    pub const fn any(&self) -> bool {
        self.x || self.y || self.theta || self.w || self.h
    }

    #[cfg(feature = "serde")]
    fn all() -> Self {
        Self::ALL
    }
}

/// A grid pose: cell position `(x, y)`, heading `theta` in degrees, and a
/// footprint `w × h` used by the visual layer.
///
/// Every field carries a "changed since last reset" flag. Setters only raise
/// the flag when the value really changes, so a renderer can skip untouched
/// attributes. A newly constructed pose has every flag raised.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy)]
pub struct Pose {
    x: f64,
    y: f64,
    theta: f64,
    w: f64,
    h: f64,
    #[cfg_attr(feature = "serde", serde(skip, default = "PoseUpdates::all"))]
    updates: PoseUpdates,
}

impl Pose {
    /// Construct a new pose with a unit footprint.
    ///
    /// # Arguments
    ///
    /// * `x`: Grid column.
    /// * `y`: Grid row.
    /// * `theta`: Heading in degrees.
    pub const fn new(x: f64, y: f64, theta: f64) -> Self {
        Pose::with_size(x, y, theta, 1.0, 1.0)
    }

    /// Construct a new pose with an explicit footprint.
    pub const fn with_size(x: f64, y: f64, theta: f64, w: f64, h: f64) -> Self {
        Pose {
            x,
            y,
            theta,
            w,
            h,
            updates: PoseUpdates::ALL,
        }
    }

    /// Pose of the cell `point`, heading 0 and unit footprint.
    pub fn from_discrete_point(point: DiscretePoint) -> Self {
        Pose::new(f64::from(point.x), f64::from(point.y), 0.0)
    }

    /// Returns the grid column.
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Returns the grid row.
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Returns the heading in degrees.
    pub fn theta(&self) -> f64 {
        self.theta
    }

    /// Returns the footprint width.
    pub fn w(&self) -> f64 {
        self.w
    }

    /// Returns the footprint height.
    pub fn h(&self) -> f64 {
        self.h
    }

    /// Sets `x`, flagging it only if the value changed.
    pub fn set_x(&mut self, value: f64) {
        if self.x != value {
            self.x = value;
            self.updates.x = true;
        }
    }

    /// Sets `y`, flagging it only if the value changed.
    pub fn set_y(&mut self, value: f64) {
        if self.y != value {
            self.y = value;
            self.updates.y = true;
        }
    }

    /// Sets `theta`, flagging it only if the value changed.
    pub fn set_theta(&mut self, value: f64) {
        if self.theta != value {
            self.theta = value;
            self.updates.theta = true;
        }
    }

    /// Sets `w`, flagging it only if the value changed.
    pub fn set_w(&mut self, value: f64) {
        if self.w != value {
            self.w = value;
            self.updates.w = true;
        }
    }

    /// Sets `h`, flagging it only if the value changed.
    pub fn set_h(&mut self, value: f64) {
        if self.h != value {
            self.h = value;
            self.updates.h = true;
        }
    }

    /// Copies every value of `other` into `self`. Only fields whose value
    /// differs are flagged.
    pub fn set_to(&mut self, other: &Pose) {
        self.set_x(other.x);
        self.set_y(other.y);
        self.set_theta(other.theta);
        self.set_w(other.w);
        self.set_h(other.h);
    }

    /// Clears every change flag.
    pub fn reset_updates(&mut self) {
        self.updates = PoseUpdates::NONE;
    }

    /// Returns `true` if any field changed since the last reset.
    pub fn any_updated(&self) -> bool {
        self.updates.any()
    }

    /// Snapshot of the change flags.
    pub fn updates(&self) -> PoseUpdates {
        self.updates
    }

    /// `x` changed since the last reset.
    pub fn x_updated(&self) -> bool {
        self.updates.x
    }

    /// `y` changed since the last reset.
    pub fn y_updated(&self) -> bool {
        self.updates.y
    }

    /// `theta` changed since the last reset.
    pub fn theta_updated(&self) -> bool {
        self.updates.theta
    }

    /// `w` changed since the last reset.
    pub fn w_updated(&self) -> bool {
        self.updates.w
    }

    /// `h` changed since the last reset.
    pub fn h_updated(&self) -> bool {
        self.updates.h
    }

    /// Component-wise floored division over all five fields.
    pub fn floor_div(self, other: Pose) -> Pose {
        Pose::with_size(
            floor(self.x / other.x),
            floor(self.y / other.y),
            floor(self.theta / other.theta),
            floor(self.w / other.w),
            floor(self.h / other.h),
        )
    }

    /// Grid cell containing this pose. Coordinates are rounded to the nearest
    /// integer, halves away from zero.
    pub fn as_discrete_point(&self) -> DiscretePoint {
        DiscretePoint::new(round(self.x) as i32, round(self.y) as i32)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Pose::new(0.0, 0.0, 0.0)
    }
}

impl PartialEq for Pose {
    fn eq(&self, other: &Self) -> bool {
        fabs(self.x - other.x) < POSE_EPSILON
            && fabs(self.y - other.y) < POSE_EPSILON
            && fabs(self.theta - other.theta) < POSE_EPSILON
            && fabs(self.w - other.w) < POSE_EPSILON
            && fabs(self.h - other.h) < POSE_EPSILON
    }
}

// `+` and `-` treat poses as positional vectors: the footprint of the left
// operand is kept as is.
impl Add for Pose {
    type Output = Pose;

    fn add(self, other: Pose) -> Pose {
        Pose::with_size(
            self.x + other.x,
            self.y + other.y,
            self.theta + other.theta,
            self.w,
            self.h,
        )
    }
}

impl Sub for Pose {
    type Output = Pose;

    fn sub(self, other: Pose) -> Pose {
        Pose::with_size(
            self.x - other.x,
            self.y - other.y,
            self.theta - other.theta,
            self.w,
            self.h,
        )
    }
}

impl Mul for Pose {
    type Output = Pose;

    fn mul(self, other: Pose) -> Pose {
        Pose::with_size(
            self.x * other.x,
            self.y * other.y,
            self.theta * other.theta,
            self.w * other.w,
            self.h * other.h,
        )
    }
}

impl Div for Pose {
    type Output = Pose;

    fn div(self, other: Pose) -> Pose {
        Pose::with_size(
            self.x / other.x,
            self.y / other.y,
            self.theta / other.theta,
            self.w / other.w,
            self.h / other.h,
        )
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(x: {:.2}, y: {:.2}, θ: {:.1}°, {:.2}×{:.2})",
            self.x, self.y, self.theta, self.w, self.h
        )
    }
}

/// An integer grid coordinate.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct DiscretePoint {
    /// Column index.
    pub x: i32,
    /// Row index.
    pub y: i32,
}

impl DiscretePoint {
    /// Creates a new `DiscretePoint`.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Sum of the absolute coordinate differences.
    pub fn manhattan_distance(&self, other: &DiscretePoint) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Straight-line distance.
    pub fn euclidean_distance(&self, other: &DiscretePoint) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        sqrt(dx * dx + dy * dy)
    }

    /// The four edge-adjacent points, in the order left, right, up (+y), down (-y).
    pub fn neighbors(&self) -> [DiscretePoint; 4] {
        [
            DiscretePoint::new(self.x - 1, self.y),
            DiscretePoint::new(self.x + 1, self.y),
            DiscretePoint::new(self.x, self.y + 1),
            DiscretePoint::new(self.x, self.y - 1),
        ]
    }
}

impl From<(i32, i32)> for DiscretePoint {
    fn from((x, y): (i32, i32)) -> Self {
        DiscretePoint::new(x, y)
    }
}

impl fmt::Display for DiscretePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_pose_equality() {
        assert_eq!(
            Pose::with_size(1.0, 2.0, 3.0, 4.0, 5.0),
            Pose::with_size(1.0, 2.0, 3.0, 4.0, 5.0)
        );
    }

    #[test]
    fn test_pose_inequality() {
        let pose = Pose::with_size(1.0, 1.0, 1.0, 1.0, 1.0);
        assert_ne!(pose, Pose::with_size(1.0, 1.0, 1.0, 1.0, 0.0));
        assert_ne!(pose, Pose::with_size(1.0, 1.0, 1.0, 0.0, 1.0));
        assert_ne!(pose, Pose::with_size(1.0, 1.0, 0.0, 1.0, 1.0));
        assert_ne!(pose, Pose::with_size(1.0, 0.0, 1.0, 1.0, 1.0));
        assert_ne!(pose, Pose::with_size(0.0, 1.0, 1.0, 1.0, 1.0));
    }

    #[test]
    fn test_equality_ignores_update_flags() {
        let mut a = Pose::new(3.0, 4.0, 90.0);
        let b = Pose::new(3.0, 4.0, 90.0);
        a.reset_updates();
        assert_eq!(a, b);
        assert_ne!(a.updates(), b.updates());
    }

    #[test]
    fn test_pose_addition_keeps_size() {
        let a = Pose::with_size(1.0, 1.0, 1.0, 1.0, 1.0);
        let b = Pose::with_size(1.0, 1.0, 1.0, 1.0, 1.0);
        assert_eq!(a + b, Pose::with_size(2.0, 2.0, 2.0, 1.0, 1.0));
    }

    #[test]
    fn test_pose_subtraction_keeps_size() {
        let a = Pose::with_size(1.0, 1.0, 1.0, 1.0, 1.0);
        let b = Pose::with_size(1.0, 1.0, 1.0, 1.0, 1.0);
        assert_eq!(a - b, Pose::with_size(0.0, 0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn test_add_then_subtract_restores_position() {
        let a = Pose::with_size(3.5, -2.0, 45.0, 0.75, 0.35);
        let b = Pose::with_size(10.0, 4.0, -90.0, 3.0, 3.0);
        let round_trip = (a + b) - b;
        assert_eq!(round_trip, a);
        // size is never touched by +/-
        assert!((round_trip.w() - 0.75).abs() < EPSILON);
        assert!((round_trip.h() - 0.35).abs() < EPSILON);
    }

    #[test]
    fn test_pose_multiplication() {
        let a = Pose::with_size(2.0, 2.0, 2.0, 2.0, 2.0);
        let b = Pose::with_size(3.0, 3.0, 3.0, 3.0, 3.0);
        assert_eq!(a * b, Pose::with_size(6.0, 6.0, 6.0, 6.0, 6.0));
    }

    #[test]
    fn test_pose_division() {
        let a = Pose::with_size(2.0, 2.0, 2.0, 2.0, 2.0);
        let b = Pose::with_size(3.0, 3.0, 3.0, 3.0, 3.0);
        let third = 2.0 / 3.0;
        assert_eq!(a / b, Pose::with_size(third, third, third, third, third));
    }

    #[test]
    fn test_pose_floor_division() {
        let a = Pose::with_size(2.0, 2.0, 2.0, 2.0, 2.0);
        let b = Pose::with_size(3.0, 3.0, 3.0, 3.0, 3.0);
        assert_eq!(a.floor_div(b), Pose::with_size(0.0, 0.0, 0.0, 0.0, 0.0));

        let c = Pose::with_size(-1.0, 7.0, 7.0, 7.0, 7.0);
        assert_eq!(c.floor_div(b), Pose::with_size(-1.0, 2.0, 2.0, 2.0, 2.0));
    }

    #[test]
    fn test_new_pose_has_every_flag_set() {
        let pose = Pose::with_size(1.0, 1.0, 1.0, 1.0, 1.0);
        assert_eq!(pose.updates(), PoseUpdates::ALL);
        assert!(pose.any_updated());
    }

    #[test]
    fn test_reset_updates() {
        let mut pose = Pose::with_size(1.0, 1.0, 1.0, 1.0, 1.0);
        pose.reset_updates();
        assert!(!pose.x_updated());
        assert!(!pose.y_updated());
        assert!(!pose.theta_updated());
        assert!(!pose.w_updated());
        assert!(!pose.h_updated());
        assert!(!pose.any_updated());
    }

    #[test]
    fn test_setter_marks_field() {
        let mut pose = Pose::new(1.0, 1.0, 0.0);
        pose.reset_updates();
        pose.set_x(pose.x() + 1.0);
        assert!(pose.x_updated());
        assert!(!pose.y_updated());
        assert!(pose.any_updated());
    }

    #[test]
    fn test_setter_with_same_value_is_silent() {
        let mut pose = Pose::new(1.0, 1.0, 0.0);
        pose.reset_updates();
        pose.set_theta(0.0);
        pose.set_w(1.0);
        assert!(!pose.any_updated());
    }

    #[test]
    fn test_set_to_self_marks_nothing() {
        let mut pose = Pose::with_size(4.0, 2.0, 270.0, 0.5, 2.0);
        pose.reset_updates();
        let copy = pose;
        pose.set_to(&copy);
        assert!(!pose.any_updated());
    }

    #[test]
    fn test_set_to_copies_values() {
        let mut a = Pose::with_size(1.0, 1.0, 1.0, 1.0, 1.0);
        let b = Pose::with_size(2.0, 2.0, 2.0, 2.0, 2.0);
        a.set_to(&b);
        assert_eq!(a, b);
    }

    #[test]
    fn test_set_to_flags_only_changed_fields() {
        let mut pose = Pose::with_size(1.0, 1.0, 1.0, 1.0, 1.0);
        pose.reset_updates();
        pose.set_to(&Pose::with_size(2.0, 1.0, 2.0, 1.0, 2.0));
        assert_eq!(
            pose.updates(),
            PoseUpdates {
                x: true,
                y: false,
                theta: true,
                w: false,
                h: true,
            }
        );
    }

    #[test]
    fn test_discrete_point_rounding() {
        assert_eq!(Pose::new(2.4, 3.6, 0.0).as_discrete_point(), DiscretePoint::new(2, 4));
        assert_eq!(Pose::new(2.5, -0.5, 0.0).as_discrete_point(), DiscretePoint::new(3, -1));
        assert_eq!(Pose::new(-0.4, 0.0, 0.0).as_discrete_point(), DiscretePoint::new(0, 0));
    }

    #[test]
    fn test_from_discrete_point() {
        let pose = Pose::from_discrete_point(DiscretePoint::new(7, -3));
        assert_eq!(pose, Pose::new(7.0, -3.0, 0.0));
        assert_eq!(pose.as_discrete_point(), DiscretePoint::new(7, -3));
    }

    #[test]
    fn test_distances() {
        let a = DiscretePoint::new(0, 0);
        let b = DiscretePoint::new(3, -4);
        assert_eq!(a.manhattan_distance(&b), 7);
        assert!((a.euclidean_distance(&b) - 5.0).abs() < EPSILON);
        assert!(a.euclidean_distance(&b) <= f64::from(a.manhattan_distance(&b)));
    }

    #[test]
    fn test_neighbor_order() {
        let p = DiscretePoint::new(5, 5);
        assert_eq!(
            p.neighbors(),
            [
                DiscretePoint::new(4, 5),
                DiscretePoint::new(6, 5),
                DiscretePoint::new(5, 6),
                DiscretePoint::new(5, 4),
            ]
        );
    }

    #[test]
    fn test_display() {
        let pose = Pose::with_size(1.0, 2.0, 90.0, 0.75, 0.35);
        assert_eq!(format!("{}", pose), "(x: 1.00, y: 2.00, θ: 90.0°, 0.75×0.35)");
        assert_eq!(format!("{}", DiscretePoint::new(-1, 4)), "(-1, 4)");
    }
}
