use crate::component::layers::{layer_layout, outermost, LayerSlot};
use crate::component::{CellMap, Component, FixedComp, OuterSurfaceSet, SurfMap};
use crate::config::FuncDataBase;
use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3};
use crate::model::BuildContext;

use super::{axes, var, Offset};

const FACE_NAMES: [&str; 6] = ["front", "back", "left", "right", "base", "top"];

/// A rectangular void wrapped in optional wall layers.
///
/// Variables (prefixed with the component name): `Length`, `Width`,
/// `Height`, `NLayers`, `LayerThick{i}`, `LayerMat{i}` or `WallMat`,
/// `VoidMat`, and the optional placement offsets. The frame origin sits on
/// the inner front face; `y` runs along the length.
///
/// Cells: `Void` and one `Layer` per non-empty layer. Links 1..=6 are the
/// outer faces in the order front, back, left, right, base, top.
#[derive(Debug, Clone)]
pub struct ShieldBlock {
    fixed: FixedComp,
    cells: CellMap,
    surfs: SurfMap,
    outer: OuterSurfaceSet,
    offset: Offset,
    length: f64,
    width: f64,
    height: f64,
    layers: Vec<f64>,
    void_mat: i32,
    layer_mats: Vec<i32>,
}

impl ShieldBlock {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            fixed: FixedComp::new(name, FACE_NAMES.len()),
            cells: CellMap::new(name),
            surfs: SurfMap::new(name),
            outer: OuterSurfaceSet::new(name),
            offset: Offset::default(),
            length: 0.0,
            width: 0.0,
            height: 0.0,
            layers: Vec::new(),
            void_mat: 0,
            layer_mats: Vec::new(),
        }
    }

    #[must_use]
    pub fn cells(&self) -> &CellMap {
        &self.cells
    }

    #[must_use]
    pub fn surfs(&self) -> &SurfMap {
        &self.surfs
    }

    #[must_use]
    pub fn outer(&self) -> &OuterSurfaceSet {
        &self.outer
    }

    /// Requests insertion into a host cell during `insertObjects`.
    pub fn add_insert_cell(&mut self, host: i32) {
        self.outer.add_insert_cell(host);
    }

    fn layout(&self) -> Vec<LayerSlot> {
        layer_layout(&self.layers)
    }

    fn centre(&self) -> Point3 {
        let frame = self.fixed.frame();
        frame.origin() + frame.y() * (self.length / 2.0)
    }

    fn half_extents(&self) -> [f64; 3] {
        [self.length / 2.0, self.width / 2.0, self.height / 2.0]
    }

    /// Outward normal and half-extent of face `face` (1..=6).
    fn face(&self, face: i32) -> (Vector3, f64) {
        let (x, y, z) = axes(self.fixed.frame());
        let [hl, hw, hh] = self.half_extents();
        match face {
            1 => (-y, hl),
            2 => (y, hl),
            3 => (-x, hw),
            4 => (x, hw),
            5 => (-z, hh),
            _ => (z, hh),
        }
    }

    fn build_box(&self, ctx: &mut BuildContext, base: i32, grow: f64) -> Result<()> {
        let block = self.fixed.block()?;
        let centre = self.centre();
        for face in 1..=6 {
            let (outward, half) = self.face(face);
            // Odd faces point back along their axis; the plane normal keeps
            // the positive axis so `lo -hi` reads as "between".
            let normal = if face % 2 == 1 { -outward } else { outward };
            ctx.build_plane(block.at(base + face), centre + outward * (half + grow), normal)?;
        }
        Ok(())
    }
}

fn box_text(base: i32) -> String {
    format!(
        "{} -{} {} -{} {} -{}",
        base + 1,
        base + 2,
        base + 3,
        base + 4,
        base + 5,
        base + 6
    )
}

fn positive(parameter: &'static str, value: f64) -> Result<f64> {
    if value > 0.0 {
        Ok(value)
    } else {
        Err(GeometryError::ParameterOutOfRange {
            parameter,
            value,
            min: 0.0,
            max: f64::INFINITY,
        }
        .into())
    }
}

impl Component for ShieldBlock {
    fn fixed(&self) -> &FixedComp {
        &self.fixed
    }

    fn fixed_mut(&mut self) -> &mut FixedComp {
        &mut self.fixed
    }

    fn populate(&mut self, vars: &FuncDataBase) -> Result<()> {
        let name = self.fixed.name().to_owned();
        self.offset = Offset::populate(vars, &name);
        self.length = positive("Length", var(vars, &name, "Length")?)?;
        self.width = positive("Width", var(vars, &name, "Width")?)?;
        self.height = positive("Height", var(vars, &name, "Height")?)?;

        let n_layers: usize = vars.eval_def_var(&format!("{name}NLayers"), 0);
        self.layers = (0..n_layers)
            .map(|i| var(vars, &name, &format!("LayerThick{i}")))
            .collect::<Result<_>>()?;
        self.layer_mats = (0..n_layers)
            .map(|i| {
                let key = format!("{name}LayerMat{i}");
                if vars.has_variable(&key) {
                    vars.eval_mat(&key)
                } else {
                    vars.eval_mat(&format!("{name}WallMat"))
                }
            })
            .collect::<Result<_>>()?;

        let void_key = format!("{name}VoidMat");
        self.void_mat = if vars.has_variable(&void_key) {
            vars.eval_mat(&void_key)?
        } else {
            0
        };
        Ok(())
    }

    fn create_unit_vector(&mut self, parent: &FixedComp, side: i32) -> Result<()> {
        self.fixed.create_unit_vector(parent, side)?;
        self.offset.apply(self.fixed.frame_mut());
        Ok(())
    }

    fn create_surfaces(&mut self, ctx: &mut BuildContext) -> Result<()> {
        self.build_box(ctx, 0, 0.0)?;
        for slot in self.layout().iter().filter(|s| s.is_active()) {
            self.build_box(ctx, slot.base, slot.outer)?;
        }
        Ok(())
    }

    fn create_objects(&mut self, ctx: &mut BuildContext) -> Result<()> {
        let block = self.fixed.block()?;
        let mut inner = ctx.compose(block, &box_text(0))?;
        let number = self.fixed.next_cell()?;
        self.cells
            .make_cell(ctx, "Void", number, self.void_mat, 0.0, inner.clone())?;

        for slot in self.layout().iter().filter(|s| s.is_active()) {
            let outer_box = ctx.compose(block, &box_text(slot.base))?;
            let number = self.fixed.next_cell()?;
            let material = self.layer_mats.get(slot.index).copied().unwrap_or(0);
            let rule = outer_box.intersect(&inner.complement());
            self.cells.make_cell(ctx, "Layer", number, material, 0.0, rule)?;
            inner = outer_box;
        }
        self.outer.add_outer_surf(&inner);
        Ok(())
    }

    fn create_links(&mut self, ctx: &BuildContext) -> Result<()> {
        let layout = self.layout();
        let (base, grow) = outermost(&layout).map_or((0, 0.0), |s| (s.base, s.outer));
        let centre = self.centre();
        for (k, name) in (1..=6).zip(FACE_NAMES) {
            let (outward, half) = self.face(k);
            let id = ctx.surfaces().real_surf(self.fixed.surf(base + k)?)?;
            let exterior = if k % 2 == 1 { -id } else { id };
            let slot = usize::try_from(k).unwrap_or_default();
            self.fixed
                .set_connect(slot, centre + outward * (half + grow), outward)?;
            self.fixed.set_link_surf_id(slot, exterior)?;
            self.fixed.name_side_index(slot, name)?;
            self.surfs.set_surf(name, exterior);
        }
        Ok(())
    }

    fn insert_objects(&mut self, ctx: &mut BuildContext) -> Result<()> {
        self.outer.insert_objects(ctx)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn vars() -> FuncDataBase {
        let mut vars = FuncDataBase::new();
        vars.add_material("Concrete", 49);
        vars.add_material("Steel", 3);
        vars.add_variable("shieldLength", 100.0);
        vars.add_variable("shieldWidth", 40.0);
        vars.add_variable("shieldHeight", 60.0);
        vars.add_variable("shieldNLayers", 3_i64);
        vars.add_variable("shieldLayerThick0", 5.0);
        vars.add_variable("shieldLayerThick1", 0.0);
        vars.add_variable("shieldLayerThick2", 10.0);
        vars.add_variable("shieldWallMat", "Concrete");
        vars.add_variable("shieldLayerMat0", "Steel");
        vars
    }

    #[test]
    fn layered_block() {
        let mut ctx = BuildContext::new(crate::config::BuildConfig::default(), vars());
        let world = FixedComp::new("World", 0);
        let mut shield = ShieldBlock::new("shield");
        shield.create_all(&mut ctx, &world, 0).unwrap();

        let cells = shield.cells();
        assert_eq!(cells.get_cell("Void", 0).unwrap(), 101);
        assert_eq!(cells.get_cells("Layer").unwrap(), vec![102, 103]);
        assert_eq!(ctx.cell(102).unwrap().material(), 3);
        assert_eq!(ctx.cell(103).unwrap().material(), 49);

        // the empty middle layer keeps its offsets reserved
        assert!(ctx.surfaces().realise(121).is_none());
        assert!(ctx.surfaces().realise(131).is_some());

        assert_relative_eq!(
            shield.fixed().link_pt(2).unwrap(),
            Point3::new(0.0, 115.0, 0.0),
            epsilon = 1e-9
        );
        assert_relative_eq!(
            shield.fixed().link_pt(1).unwrap(),
            Point3::new(0.0, -15.0, 0.0),
            epsilon = 1e-9
        );
        let back = shield.fixed().find_link("back").unwrap();
        assert_eq!(back, 2);
        let exit = shield.fixed().main_rule(back).unwrap();
        assert!(exit.is_valid_in(ctx.surfaces(), &Point3::new(0.0, 120.0, 0.0)).unwrap());
        assert!(!exit.is_valid_in(ctx.surfaces(), &Point3::new(0.0, 110.0, 0.0)).unwrap());
        let front = shield.fixed().main_rule(1).unwrap();
        assert!(front.is_valid_in(ctx.surfaces(), &Point3::new(0.0, -20.0, 0.0)).unwrap());
    }

    #[test]
    fn layer_cell_is_a_shell() {
        let mut ctx = BuildContext::new(crate::config::BuildConfig::default(), vars());
        let mut shield = ShieldBlock::new("shield");
        shield.create_all(&mut ctx, &FixedComp::new("World", 0), 0).unwrap();
        let reg = ctx.surfaces();
        let layer = ctx.cell(102).unwrap().rule();
        assert!(layer.is_valid_in(reg, &Point3::new(0.0, -2.0, 0.0)).unwrap());
        assert!(!layer.is_valid_in(reg, &Point3::new(0.0, 50.0, 0.0)).unwrap());
        assert!(!layer.is_valid_in(reg, &Point3::new(0.0, -10.0, 0.0)).unwrap());
        let outer = shield.outer().outer_surf();
        assert!(outer.is_valid_in(reg, &Point3::new(0.0, -10.0, 0.0)).unwrap());
        assert!(!outer.is_valid_in(reg, &Point3::new(0.0, -16.0, 0.0)).unwrap());
    }

    #[test]
    fn bad_dimension_is_reported_with_stage() {
        let mut vars = vars();
        vars.add_variable("shieldHeight", -1.0);
        let mut ctx = BuildContext::new(crate::config::BuildConfig::default(), vars);
        let mut shield = ShieldBlock::new("shield");
        let err = shield
            .create_all(&mut ctx, &FixedComp::new("World", 0), 0)
            .unwrap_err();
        assert_eq!(err.breadcrumbs(), vec![("shield", "populate")]);
    }
}
