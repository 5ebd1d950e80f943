//! Importing GDSII into a [`Library`].

use std::collections::{HashMap, HashSet};

use arcstr::ArcStr;
use gds21::{GdsLibrary, GdsUnits};
use geometry::{
    point::Point,
    prelude::{Polygon, Transformation},
    rect::Rect,
};
use layir::{Cell, CellId, Instance, Library, LibraryBuilder, Shape, Text};
use thiserror::Error;
use tracing::{span, Level};

use crate::{GdsLayer, METERS_PER_MICRON};

#[derive(Default)]
pub struct GdsImportOpts {
    /// Expected library units; a mismatch is an error.
    pub units: Option<GdsUnits>,
}

/// An error encountered while converting a GDS library to LayIR.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GdsImportError {
    #[error("GDS database unit {found} does not match the expected {expected}")]
    UnitMismatch { expected: f64, found: f64 },
    #[error("duplicate cell name: `{0}`")]
    DuplicateCell(ArcStr),
    #[error("cell not found: `{0}`")]
    MissingCell(ArcStr),
    #[error("invalid boundary in cell `{0}`: {1}")]
    InvalidBoundary(ArcStr, &'static str),
    #[error("unsupported GDS feature in cell `{0}`: {1}")]
    Unsupported(ArcStr, &'static str),
    #[error("negative layer number {0}")]
    InvalidLayer(i16),
    #[error("error building library: {0}")]
    Build(#[from] layir::BuildError),
}

type Result<T> = std::result::Result<T, GdsImportError>;

pub fn import_gds(lib: &GdsLibrary, opts: GdsImportOpts) -> Result<Library<GdsLayer>> {
    let importer = GdsImporter::new(lib, opts);
    importer.import()
}

/// An importer for GDS files.
pub struct GdsImporter<'a> {
    lib: LibraryBuilder<GdsLayer>,
    gds: &'a GdsLibrary,
    opts: GdsImportOpts,
    /// Micrometers per database unit.
    scale: f64,
    cell: ArcStr,
}

impl<'a> GdsImporter<'a> {
    /// Creates a new GDS importer.
    pub fn new(gds: &'a GdsLibrary, opts: GdsImportOpts) -> Self {
        Self {
            lib: LibraryBuilder::new(),
            scale: gds.units.db_unit() / METERS_PER_MICRON,
            gds,
            opts,
            cell: ArcStr::default(),
        }
    }

    /// Imports a [`GdsLibrary`].
    pub fn import(mut self) -> Result<Library<GdsLayer>> {
        self.check_units()?;
        for strukt in GdsDepOrder::new(self.gds).total_order()? {
            self.import_and_add(strukt)?;
        }
        Ok(self.lib.build()?)
    }

    /// Imports a single cell and all of its dependencies.
    pub fn import_cell(mut self, name: impl Into<ArcStr>) -> Result<Library<GdsLayer>> {
        let name = name.into();
        self.check_units()?;

        let order = GdsDepOrder::new(self.gds).cell_order(&name)?;
        if order.is_empty() {
            tracing::event!(Level::ERROR, cell_name = %name, "cell not found: `{}`", name);
            return Err(GdsImportError::MissingCell(name));
        }
        for strukt in order {
            self.import_and_add(strukt)?;
        }
        Ok(self.lib.build()?)
    }

    /// Checks that the database units match the expected units.
    fn check_units(&self) -> Result<()> {
        let found = self.gds.units.db_unit();
        if let Some(expected) = &self.opts.units {
            let expected = expected.db_unit();
            if (found - expected).abs() / expected > 1e-3 {
                return Err(GdsImportError::UnitMismatch { expected, found });
            }
        }
        Ok(())
    }

    /// Imports and adds a cell if not already defined.
    fn import_and_add(&mut self, strukt: &gds21::GdsStruct) -> Result<CellId> {
        let name = ArcStr::from(strukt.name.as_str());
        if self.lib.try_cell_id_named(&name).is_some() {
            tracing::event!(Level::ERROR, cell_name = %name, "duplicate cell name: `{}`", name);
            return Err(GdsImportError::DuplicateCell(name));
        }

        let mut cell = Cell::new(name);
        self.import_gds_struct(strukt, &mut cell)?;
        Ok(self.lib.add_cell(cell))
    }

    fn import_gds_struct(
        &mut self,
        strukt: &gds21::GdsStruct,
        cell: &mut Cell<GdsLayer>,
    ) -> Result<()> {
        let span = span!(Level::INFO, "cell", name=%cell.name());
        let _guard = span.enter();
        self.cell = cell.name().clone();

        for elem in &strukt.elems {
            use gds21::GdsElement::*;
            match elem {
                GdsBoundary(x) => cell.add_element(self.import_boundary(x)?),
                GdsBox(x) => cell.add_element(self.import_box(x)?),
                GdsStructRef(x) => {
                    cell.add_instance(self.import_instance(x)?);
                }
                GdsArrayRef(x) => {
                    for inst in self.import_instance_array(x)? {
                        cell.add_instance(inst);
                    }
                }
                GdsTextElem(x) => cell.add_element(self.import_text_elem(x)?),
                GdsPath(_) => {
                    tracing::warn!(cell = %cell.name(), "ignoring GDS path element");
                }
                GdsNode(_) => {
                    tracing::warn!(cell = %cell.name(), "ignoring unsupported GDS node element");
                }
            };
        }
        Ok(())
    }

    fn import_boundary(&self, x: &gds21::GdsBoundary) -> Result<Shape<GdsLayer>> {
        let mut pts = self.import_point_vec(&x.xy);
        let (first, last) = match (pts.first(), pts.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => {
                return Err(GdsImportError::InvalidBoundary(
                    self.cell.clone(),
                    "empty polygons are not permitted",
                ))
            }
        };
        if first != last {
            tracing::event!(Level::ERROR, first_pt=?first, last_pt=?last, "GDS boundary is not closed");
            return Err(GdsImportError::InvalidBoundary(
                self.cell.clone(),
                "the last point must equal the first point",
            ));
        }
        pts.pop();
        if pts.len() < 3 {
            return Err(GdsImportError::InvalidBoundary(
                self.cell.clone(),
                "fewer than three vertices",
            ));
        }

        // Axis-aligned quadrilaterals come back as rectangles.
        let is_rect = pts.len() == 4
            && ((pts[0].x == pts[1].x
                && pts[1].y == pts[2].y
                && pts[2].x == pts[3].x
                && pts[3].y == pts[0].y)
                || (pts[0].y == pts[1].y
                    && pts[1].x == pts[2].x
                    && pts[2].y == pts[3].y
                    && pts[3].x == pts[0].x));
        let inner = if is_rect {
            geometry::shape::Shape::Rect(Rect::new(pts[0], pts[2]))
        } else {
            geometry::shape::Shape::Polygon(Polygon::from_verts(pts))
        };

        Ok(Shape::new(import_layer(x.layer, x.datatype)?, inner))
    }

    fn import_box(&self, x: &gds21::GdsBox) -> Result<Shape<GdsLayer>> {
        // GDS boxes carry five points; the first and third are opposite corners.
        let inner = Rect::new(self.import_point(&x.xy[0]), self.import_point(&x.xy[2]));
        Ok(Shape::new(import_layer(x.layer, x.boxtype)?, inner))
    }

    fn import_text_elem(&self, x: &gds21::GdsTextElem) -> Result<Text<GdsLayer>> {
        let loc = self.import_point(&x.xy);
        let trans = match &x.strans {
            Some(strans) => self.import_strans(loc, strans)?,
            None => Transformation::translate(loc.x, loc.y),
        };
        Ok(Text::with_transformation(
            import_layer(x.layer, x.texttype)?,
            x.string.as_str(),
            trans,
        ))
    }

    fn import_instance(&self, sref: &gds21::GdsStructRef) -> Result<Instance> {
        let cell = self.child(sref.name.as_str())?;
        let loc = self.import_point(&sref.xy);
        let trans = match &sref.strans {
            Some(strans) => self.import_strans(loc, strans)?,
            None => Transformation::translate(loc.x, loc.y),
        };
        Ok(Instance::with_transformation(
            cell,
            sref.name.as_str(),
            trans,
        ))
    }

    /// Imports a rectangular [`gds21::GdsArrayRef`] as one instance per array element.
    ///
    /// Instance names are of the form `{array.name}_{col}_{row}`.
    fn import_instance_array(&self, aref: &gds21::GdsArrayRef) -> Result<Vec<Instance>> {
        let cell = self.child(aref.name.as_str())?;

        let p0 = self.import_point(&aref.xy[0]);
        let p1 = self.import_point(&aref.xy[1]);
        let p2 = self.import_point(&aref.xy[2]);
        if p0.y != p1.y || p0.x != p2.x {
            tracing::event!(Level::ERROR, p0=?p0, p1=?p1, p2=?p2, "unsupported non-rectangular GDS instance array");
            return Err(GdsImportError::Unsupported(
                self.cell.clone(),
                "non-rectangular instance array",
            ));
        }
        let cols = i32::from(aref.cols).max(1);
        let rows = i32::from(aref.rows).max(1);
        let xstep = (p1.x - p0.x) / cols as f64;
        let ystep = (p2.y - p0.y) / rows as f64;

        let mut insts = Vec::with_capacity((rows * cols) as usize);
        for ix in 0..cols {
            for iy in 0..rows {
                let loc = Point::new(p0.x + ix as f64 * xstep, p0.y + iy as f64 * ystep);
                let trans = match &aref.strans {
                    Some(strans) => self.import_strans(loc, strans)?,
                    None => Transformation::translate(loc.x, loc.y),
                };
                insts.push(Instance::with_transformation(
                    cell,
                    arcstr::format!("{}_{}_{}", aref.name, ix, iy),
                    trans,
                ));
            }
        }
        Ok(insts)
    }

    fn child(&self, name: &str) -> Result<CellId> {
        self.lib.try_cell_id_named(name).ok_or_else(|| {
            tracing::event!(Level::ERROR, cell_name=%name, "cell not found: `{}`", name);
            GdsImportError::MissingCell(name.into())
        })
    }

    fn import_point(&self, pt: &gds21::GdsPoint) -> Point {
        Point::new(pt.x as f64 * self.scale, pt.y as f64 * self.scale)
    }

    fn import_point_vec(&self, pts: &[gds21::GdsPoint]) -> Vec<Point> {
        pts.iter().map(|p| self.import_point(p)).collect()
    }

    fn import_strans(&self, loc: Point, strans: &gds21::GdsStrans) -> Result<Transformation> {
        if strans.abs_mag || strans.abs_angle {
            return Err(GdsImportError::Unsupported(
                self.cell.clone(),
                "absolute magnitude or angle",
            ));
        }
        if strans.mag.is_some_and(|mag| mag != 1.) {
            return Err(GdsImportError::Unsupported(
                self.cell.clone(),
                "magnification",
            ));
        }
        Ok(Transformation::from_opts(
            loc,
            strans.reflected,
            strans.angle.unwrap_or_default(),
        ))
    }
}

fn import_layer(layer: i16, datatype: i16) -> Result<GdsLayer> {
    let layer_num = u16::try_from(layer).map_err(|_| GdsImportError::InvalidLayer(layer))?;
    let datatype = u16::try_from(datatype).map_err(|_| GdsImportError::InvalidLayer(datatype))?;
    Ok(GdsLayer(layer_num, datatype))
}

/// Orders GDS structs so that each struct comes after every struct it instantiates.
#[derive(Debug)]
struct GdsDepOrder<'a> {
    strukts: HashMap<&'a str, &'a gds21::GdsStruct>,
    all: &'a [gds21::GdsStruct],
    stack: Vec<&'a gds21::GdsStruct>,
    seen: HashSet<&'a str>,
}

impl<'a> GdsDepOrder<'a> {
    fn new(gdslib: &'a GdsLibrary) -> Self {
        let strukts = gdslib.structs.iter().map(|s| (s.name.as_str(), s)).collect();
        Self {
            strukts,
            all: &gdslib.structs,
            stack: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Returns every struct in the library, dependencies first.
    fn total_order(mut self) -> Result<Vec<&'a gds21::GdsStruct>> {
        for s in self.all {
            self.push(s)?;
        }
        Ok(self.stack)
    }

    /// Returns `cell` and its dependencies, dependencies first.
    fn cell_order(mut self, cell: &str) -> Result<Vec<&'a gds21::GdsStruct>> {
        if let Some(strukt) = self.strukts.get(cell).copied() {
            self.push(strukt)?;
        }
        Ok(self.stack)
    }

    fn push(&mut self, strukt: &'a gds21::GdsStruct) -> Result<()> {
        if self.seen.contains(strukt.name.as_str()) {
            return Ok(());
        }
        self.seen.insert(strukt.name.as_str());
        for elem in &strukt.elems {
            use gds21::GdsElement::*;
            let child = match elem {
                GdsStructRef(x) => x.name.as_str(),
                GdsArrayRef(x) => x.name.as_str(),
                _ => continue,
            };
            let child = self
                .strukts
                .get(child)
                .copied()
                .ok_or_else(|| GdsImportError::MissingCell(child.into()))?;
            self.push(child)?;
        }
        self.stack.push(strukt);
        Ok(())
    }
}
