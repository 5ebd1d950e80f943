//! Exporting a [`Library`] to GDSII.

use arcstr::ArcStr;
use gds21::{
    GdsBoundary, GdsElement, GdsLibrary, GdsPoint, GdsStrans, GdsStruct, GdsStructRef,
    GdsTextElem, GdsUnits,
};
use geometry::{point::Point, polygon::Polygon, prelude::Transformation, rect::Rect};
use layir::{Cell, Element, Instance, Library, Port, Shape, Text};
use thiserror::Error;

use crate::{GdsLayer, METERS_PER_MICRON};

pub struct GdsExportOpts {
    /// Name of the GDS library.
    pub name: ArcStr,
    /// Library units; defaults to [`default_units`](crate::default_units).
    pub units: Option<GdsUnits>,
    /// Whether to emit a text label for each cell port.
    pub port_labels: bool,
}

impl Default for GdsExportOpts {
    fn default() -> Self {
        Self {
            name: arcstr::literal!("LIB"),
            units: None,
            port_labels: true,
        }
    }
}

/// An error encountered while exporting a library to GDSII.
#[derive(Error, Debug, Clone)]
pub enum GdsExportError {
    /// A coordinate does not fit in a 32-bit database unit value.
    #[error("coordinate {value} um in cell `{cell}` is out of range for GDS")]
    CoordinateOutOfRange { cell: ArcStr, value: f64 },
    /// A layer number does not fit in a GDS layer record.
    #[error("layer {layer} in cell `{cell}` is out of range for GDS")]
    LayerOutOfRange { cell: ArcStr, layer: GdsLayer },
    /// A polygon has fewer than three vertices.
    #[error("degenerate polygon with {0} vertices in cell `{1}`")]
    DegeneratePolygon(usize, ArcStr),
    /// An error from the GDS writer.
    ///
    /// Stored as its debug rendering, since [`gds21::GdsError`] is not `Send`.
    #[error("error writing GDS: {0}")]
    Gds(ArcStr),
}

impl From<gds21::GdsError> for GdsExportError {
    fn from(value: gds21::GdsError) -> Self {
        Self::Gds(arcstr::format!("{value:?}"))
    }
}

type Result<T> = std::result::Result<T, GdsExportError>;

/// Exports `lib` to a [`GdsLibrary`], one structure per cell in topological order.
pub fn export_gds(lib: &Library<GdsLayer>, opts: GdsExportOpts) -> Result<GdsLibrary> {
    let units = opts.units.clone().unwrap_or_else(crate::default_units);
    let exporter = GdsExporter {
        scale: METERS_PER_MICRON / units.db_unit(),
        units,
        opts,
        lib,
        cell: ArcStr::default(),
    };
    exporter.export()
}

struct GdsExporter<'a> {
    opts: GdsExportOpts,
    units: GdsUnits,
    /// Database units per micrometer.
    scale: f64,
    lib: &'a Library<GdsLayer>,
    /// The cell currently being exported, for error reporting.
    cell: ArcStr,
}

impl GdsExporter<'_> {
    fn export(mut self) -> Result<GdsLibrary> {
        let mut gds = GdsLibrary::new(self.opts.name.as_str());
        gds.units = self.units.clone();
        for id in self.lib.topological_order() {
            let cell = self.lib.cell(id);
            let strukt = self.export_cell(cell)?;
            gds.structs.push(strukt);
        }
        tracing::debug!(structs = gds.structs.len(), "exported GDS library");
        Ok(gds)
    }

    fn export_cell(&mut self, cell: &Cell<GdsLayer>) -> Result<GdsStruct> {
        self.cell = cell.name().clone();
        let mut gcell = GdsStruct::new(cell.name().as_str());
        for elt in cell.elements() {
            gcell.elems.push(self.export_element(elt)?);
        }
        if self.opts.port_labels {
            for (name, port) in cell.ports() {
                gcell.elems.push(self.export_port(name, port)?);
            }
        }
        for (_, inst) in cell.instances() {
            gcell.elems.push(self.export_instance(inst)?);
        }
        Ok(gcell)
    }

    fn export_instance(&self, inst: &Instance) -> Result<GdsElement> {
        let cell = self.lib.cell(inst.child());
        let trans = inst.transformation();
        Ok(GdsElement::GdsStructRef(GdsStructRef {
            name: cell.name().as_str().into(),
            xy: self.export_point(trans.offset_point())?,
            strans: export_strans(trans),
            ..Default::default()
        }))
    }

    fn export_element(&self, elt: &Element<GdsLayer>) -> Result<GdsElement> {
        match elt {
            Element::Shape(shape) => self.export_shape(shape),
            Element::Text(text) => self.export_text(text),
        }
    }

    fn export_shape(&self, shape: &Shape<GdsLayer>) -> Result<GdsElement> {
        let (layer, datatype) = self.export_layer(*shape.layer())?;
        let xy = match shape.shape() {
            geometry::shape::Shape::Rect(rect) => self.export_rect(rect)?,
            geometry::shape::Shape::Polygon(poly) => self.export_polygon(poly)?,
        };
        Ok(GdsElement::GdsBoundary(GdsBoundary {
            layer,
            datatype,
            xy,
            ..Default::default()
        }))
    }

    fn export_point(&self, p: Point) -> Result<GdsPoint> {
        Ok(GdsPoint::new(
            self.export_coord(p.x)?,
            self.export_coord(p.y)?,
        ))
    }

    fn export_coord(&self, value: f64) -> Result<i32> {
        let scaled = (value * self.scale).round();
        if !scaled.is_finite() || scaled < i32::MIN as f64 || scaled > i32::MAX as f64 {
            return Err(GdsExportError::CoordinateOutOfRange {
                cell: self.cell.clone(),
                value,
            });
        }
        Ok(scaled as i32)
    }

    fn export_polygon(&self, poly: &Polygon) -> Result<Vec<GdsPoint>> {
        if poly.len() < 3 {
            return Err(GdsExportError::DegeneratePolygon(
                poly.len(),
                self.cell.clone(),
            ));
        }
        let mut points = poly
            .points()
            .iter()
            .map(|&p| self.export_point(p))
            .collect::<Result<Vec<_>>>()?;
        // GDS boundaries are explicitly closed.
        points.push(points[0].clone());
        Ok(points)
    }

    fn export_rect(&self, rect: &Rect) -> Result<Vec<GdsPoint>> {
        let mut points = rect
            .corners()
            .into_iter()
            .map(|p| self.export_point(p))
            .collect::<Result<Vec<_>>>()?;
        points.push(points[0].clone());
        Ok(points)
    }

    fn export_text(&self, text: &Text<GdsLayer>) -> Result<GdsElement> {
        let (layer, texttype) = self.export_layer(*text.layer())?;
        let trans = text.transformation();
        Ok(GdsElement::GdsTextElem(GdsTextElem {
            string: text.text().as_str().into(),
            layer,
            texttype,
            xy: self.export_point(trans.offset_point())?,
            strans: export_strans(trans),
            ..Default::default()
        }))
    }

    fn export_port(&self, name: &ArcStr, port: &Port<GdsLayer>) -> Result<GdsElement> {
        let (layer, texttype) = self.export_layer(*port.layer())?;
        Ok(GdsElement::GdsTextElem(GdsTextElem {
            string: name.as_str().into(),
            layer,
            texttype,
            xy: self.export_point(port.center())?,
            ..Default::default()
        }))
    }

    fn export_layer(&self, layer: GdsLayer) -> Result<(i16, i16)> {
        let err = || GdsExportError::LayerOutOfRange {
            cell: self.cell.clone(),
            layer,
        };
        Ok((
            i16::try_from(layer.0).map_err(|_| err())?,
            i16::try_from(layer.1).map_err(|_| err())?,
        ))
    }
}

fn export_strans(trans: Transformation) -> Option<GdsStrans> {
    if trans.angle() == 0. && !trans.reflects_vert() {
        return None;
    }
    Some(GdsStrans {
        reflected: trans.reflects_vert(),
        angle: (trans.angle() != 0.).then_some(trans.angle()),
        ..Default::default()
    })
}
