use math::{rotate_point, Angle, FixedPoint, ANG90, FRACBITS, FRACUNIT};

use crate::defs::ShadeRef;

/// Parametric clip positions are in the range `0..=CLIPUNIT`
pub const CLIPUNIT: i64 = 1 << 30;

/// A point in camera space, `y` is depth
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct CamPoint {
    pub x: FixedPoint,
    pub y: FixedPoint,
}

impl CamPoint {
    pub const fn new(x: FixedPoint, y: FixedPoint) -> Self {
        Self { x, y }
    }
}

/// Camera position plus every projection constant derived from the view size
/// and field of view.
#[derive(Debug, Clone, Copy)]
pub struct View {
    pub x: FixedPoint,
    pub y: FixedPoint,
    pub z: FixedPoint,
    pub angle: Angle,

    pub width: i32,
    pub height: i32,
    pub centerx: i32,
    pub centery: i32,
    pub centerx_frac: FixedPoint,
    pub centery_frac: FixedPoint,

    /// tan(fov / 2)
    pub focal_tangent: FixedPoint,
    pub focal_x: FixedPoint,
    pub focal_y: FixedPoint,
    pub y_aspect_mul: FixedPoint,

    pub psprite_xscale: FixedPoint,
    pub psprite_yscale: FixedPoint,
    pub psprite_xiscale: FixedPoint,

    /// Scales distance light so it looks the same at any view width
    pub light_scale_x_mul: FixedPoint,
}

impl View {
    /// `fov` is the horizontal field of view in degrees
    pub fn new(width: i32, height: i32, fov: f32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let centerx = width / 2;
        let centery = height / 2;
        let centerx_frac = FixedPoint::from(centerx);
        let centery_frac = FixedPoint::from(centery);

        let fov = fov.clamp(1.0, 179.0);
        let focal_tangent =
            FixedPoint::new(((fov.to_radians() / 2.0).tan() * FRACUNIT as f32).round() as i32);
        let focal_x = centerx_frac / focal_tangent;
        let y_aspect_mul =
            FixedPoint::new((((320 * height as i64) << FRACBITS) / (200 * width as i64)) as i32);
        let focal_y = focal_x * y_aspect_mul;

        let psprite_xscale = FixedPoint::new(centerx_frac.raw() / 160);
        let psprite_yscale = psprite_xscale * y_aspect_mul;
        let psprite_xiscale = FixedPoint::unit() / psprite_xscale;

        Self {
            x: FixedPoint::zero(),
            y: FixedPoint::zero(),
            z: FixedPoint::zero(),
            angle: Angle::default(),
            width,
            height,
            centerx,
            centery,
            centerx_frac,
            centery_frac,
            focal_tangent,
            focal_x,
            focal_y,
            y_aspect_mul,
            psprite_xscale,
            psprite_yscale,
            psprite_xiscale,
            light_scale_x_mul: FixedPoint::from(320) / FixedPoint::from(width),
        }
    }

    /// Place the camera
    pub fn with_position(mut self, x: FixedPoint, y: FixedPoint, z: FixedPoint, angle: Angle) -> Self {
        self.x = x;
        self.y = y;
        self.z = z;
        self.angle = angle;
        self
    }

    /// Move the vertical centre, the weapon overlay draws with its own
    pub fn with_centery(mut self, centery: i32) -> Self {
        self.centery = centery;
        self.centery_frac = FixedPoint::from(centery);
        self
    }

    /// World to camera space. `y` points away from the viewer.
    #[inline]
    pub fn to_camera(&self, x: FixedPoint, y: FixedPoint) -> CamPoint {
        let (tx, ty) = rotate_point(x - self.x, y - self.y, Angle::new(ANG90) - self.angle);
        CamPoint::new(tx, ty)
    }

    /// Angle from the viewer to a world point
    #[inline]
    pub fn point_to_angle(&self, x: FixedPoint, y: FixedPoint) -> Angle {
        Angle::from_delta(x - self.x, y - self.y)
    }

    /// R_ProjectPointX
    pub fn project_x(&self, x: FixedPoint, y: FixedPoint) -> i32 {
        if y.raw() <= 0 {
            return self.centerx;
        }
        let offset = self.focal_x.raw() as i64 * x.raw() as i64 / y.raw() as i64;
        let frac = (self.centerx_frac.raw() as i64 + offset).clamp(i32::MIN as i64, i32::MAX as i64);
        FixedPoint::new(frac as i32).round_int()
    }

    /// R_ProjectPointY, `z` is relative to the view height
    pub fn project_y(&self, z: FixedPoint, y: FixedPoint) -> i32 {
        if y.raw() <= 0 {
            return self.centery;
        }
        let offset = self.focal_y.raw() as i64 * z.raw() as i64 / y.raw() as i64;
        let frac = (self.centery_frac.raw() as i64 - offset).clamp(i32::MIN as i64, i32::MAX as i64);
        FixedPoint::new(frac as i32).round_int()
    }

    /// Clamp a column range to the view, `None` when nothing is left
    #[inline]
    pub fn check_projection_x(&self, x1: i32, x2: i32) -> Option<(i32, i32)> {
        let x1 = x1.max(0);
        let x2 = x2.min(self.width - 1);
        (x1 < self.width && x2 >= 0 && x1 <= x2).then_some((x1, x2))
    }

    /// Clamp a row range to the view, `None` when nothing is left
    #[inline]
    pub fn check_projection_y(&self, y1: i32, y2: i32) -> Option<(i32, i32)> {
        let y1 = y1.max(0);
        let y2 = y2.min(self.height - 1);
        (y1 < self.height && y2 >= 0 && y1 <= y2).then_some((y1, y2))
    }

    /// Clip a camera space segment to the near plane at `clip_dist` and the
    /// left and right sides of the view. Returns the parametric positions of
    /// the surviving part in `0..=CLIPUNIT`, or `None` if nothing survives.
    pub fn clip_to_frustum(&self, v1: CamPoint, v2: CamPoint, clip_dist: FixedPoint) -> Option<(i64, i64)> {
        let mut lclip = 0i64;
        let mut rclip = CLIPUNIT;

        let mut clip_plane = |d1: i64, d2: i64| -> bool {
            if d1 < 0 && d2 < 0 {
                return false;
            }
            if d1 < 0 {
                lclip = lclip.max(CLIPUNIT * d1 / (d1 - d2));
            } else if d2 < 0 {
                rclip = rclip.min(CLIPUNIT * d1 / (d1 - d2));
            }
            true
        };

        // near
        let n1 = (v1.y - clip_dist).raw() as i64;
        let n2 = (v2.y - clip_dist).raw() as i64;
        if !clip_plane(n1, n2) {
            return None;
        }

        let side = |v: CamPoint| (v.y.raw() as i64 * self.focal_tangent.raw() as i64) >> FRACBITS;
        // left
        if !clip_plane(side(v1) + v1.x.raw() as i64, side(v2) + v2.x.raw() as i64) {
            return None;
        }
        // right
        if !clip_plane(side(v1) - v1.x.raw() as i64, side(v2) - v2.x.raw() as i64) {
            return None;
        }

        (lclip <= rclip).then_some((lclip, rclip))
    }
}

/// R_ClipLine. Trim a segment to the parametric range from `clip_to_frustum`.
pub fn clip_line(v1: CamPoint, v2: CamPoint, lclip: i64, rclip: i64) -> (CamPoint, CamPoint) {
    let lerp = |a: FixedPoint, b: FixedPoint, t: i64| {
        let d = (b - a).raw() as i64;
        a + (d * t / CLIPUNIT) as i32
    };
    (
        CamPoint::new(lerp(v1.x, v2.x, lclip), lerp(v1.y, v2.y, lclip)),
        CamPoint::new(lerp(v1.x, v2.x, rclip), lerp(v1.y, v2.y, rclip)),
    )
}

/// Lighting state for the frame
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameLight {
    /// Forces every sprite to one colourmap level (light amp goggles)
    pub fixed_light_level: Option<usize>,
    /// Forces every sprite to one colourmap (invulnerability)
    pub fixed_colourmap: Option<ShadeRef>,
    pub extralight: i32,
    /// Fog or a fading sector colourmap, disables full bright and extralight
    pub foggy: bool,
}

impl FrameLight {
    /// `extralight` unless fog suppresses it
    #[inline]
    pub fn effective_extralight(&self) -> i32 {
        if self.foggy { 0 } else { self.extralight }
    }
}

/// Everything a frame of masked rendering reads that isn't map data
#[derive(Debug, Clone, Copy)]
pub struct RenderContext {
    pub view: View,
    pub light: FrameLight,
    /// Interpolation between the previous and current tic, `0..=FRACUNIT`
    pub lerp: FixedPoint,
}

impl RenderContext {
    pub fn new(view: View) -> Self {
        Self {
            view,
            light: FrameLight::default(),
            lerp: FixedPoint::new(FRACUNIT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{clip_line, CamPoint, View, CLIPUNIT};
    use crate::defs::NEARCLIP;
    use math::{Angle, FixedPoint, ANG90};

    fn fp(v: i32) -> FixedPoint {
        FixedPoint::from(v)
    }

    #[test]
    fn classic_view_constants() {
        let view = View::new(320, 200, 90.0);
        assert_eq!(view.centerx, 160);
        assert_eq!(view.centery, 100);
        assert!((view.focal_x - fp(160)).abs() < FixedPoint::new(64));
        assert_eq!(view.y_aspect_mul, FixedPoint::unit());
        assert_eq!(view.psprite_xscale, FixedPoint::unit());
        assert_eq!(view.light_scale_x_mul, FixedPoint::unit());
    }

    #[test]
    fn camera_space_looks_down_y() {
        // facing east, a thing 100 units east is straight ahead
        let view = View::new(320, 200, 90.0);
        let p = view.to_camera(fp(100), fp(0));
        assert!(p.x.abs() < FixedPoint::unit());
        assert!((p.y - fp(100)).abs() < FixedPoint::unit());

        // facing north, a thing to the east is on the right
        let view = view.with_position(fp(0), fp(0), fp(0), Angle::new(ANG90));
        let p = view.to_camera(fp(100), fp(0));
        assert!((p.x - fp(100)).abs() < FixedPoint::unit());
        assert!(p.y.abs() < FixedPoint::unit());
    }

    #[test]
    fn project_centre_and_edges() {
        let view = View::new(320, 200, 90.0);
        assert_eq!(view.project_x(fp(0), fp(50)), 160);
        // 45 degrees right lands on the right edge
        let x = view.project_x(fp(50), fp(50));
        assert!((319..=320).contains(&x));
        assert_eq!(view.project_y(fp(0), fp(50)), 100);
        assert!(view.project_y(fp(10), fp(50)) < 100);
    }

    #[test]
    fn projection_checks_clamp() {
        let view = View::new(320, 200, 90.0);
        assert_eq!(view.check_projection_x(-10, 400), Some((0, 319)));
        assert_eq!(view.check_projection_x(320, 400), None);
        assert_eq!(view.check_projection_x(-20, -1), None);
        assert_eq!(view.check_projection_y(10, 5), None);
    }

    #[test]
    fn frustum_rejects_behind_and_outside() {
        let view = View::new(320, 200, 90.0);
        // behind the near plane
        let v1 = CamPoint::new(fp(-8), fp(2));
        let v2 = CamPoint::new(fp(8), fp(2));
        assert!(view.clip_to_frustum(v1, v2, NEARCLIP).is_none());
        // completely left of the view
        let v1 = CamPoint::new(fp(-300), fp(100));
        let v2 = CamPoint::new(fp(-200), fp(100));
        assert!(view.clip_to_frustum(v1, v2, NEARCLIP).is_none());
        // fully visible
        let v1 = CamPoint::new(fp(-16), fp(100));
        let v2 = CamPoint::new(fp(16), fp(100));
        assert_eq!(view.clip_to_frustum(v1, v2, NEARCLIP), Some((0, CLIPUNIT)));
    }

    #[test]
    fn frustum_trims_left_edge() {
        let view = View::new(320, 200, 90.0);
        let v1 = CamPoint::new(fp(-150), fp(100));
        let v2 = CamPoint::new(fp(50), fp(100));
        let (l, r) = view.clip_to_frustum(v1, v2, NEARCLIP).unwrap();
        assert!(l > 0);
        assert_eq!(r, CLIPUNIT);
        let (t1, t2) = clip_line(v1, v2, l, r);
        // the left edge of the view at depth 100 is x = -100
        assert!((t1.x - fp(-100)).abs() < fp(1));
        assert_eq!(t2, v2);
    }
}
