//! Variable data access for an in-memory NetCDF classic file.

use std::io::Cursor;

use bytes::Bytes;
use netcdf3::{Attribute, DataSet, DataType, DataVector, FileReader};
use tracing::trace;

use crate::error::{NetCdfError, NetCdfResult};

const CDF1_MAGIC: &[u8] = b"CDF\x01";
const CDF2_MAGIC: &[u8] = b"CDF\x02";

/// Whether `data` starts with a classic or 64-bit offset magic number.
pub fn is_classic(data: &[u8]) -> bool {
    data.starts_with(CDF1_MAGIC) || data.starts_with(CDF2_MAGIC)
}

/// Shape and type of one variable, copied out of the file header.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableInfo {
    pub name: String,
    pub dimensions: Vec<String>,
    pub shape: Vec<usize>,
    pub data_type: DataType,
}

impl VariableInfo {
    /// Char arrays hold text, not measurements.
    pub fn is_numeric(&self) -> bool {
        self.data_type != DataType::U8
    }
}

/// CF packing attributes of one variable.
#[derive(Debug, Clone, Default, PartialEq)]
struct Packing {
    scale_factor: Option<f64>,
    add_offset: Option<f64>,
    fill_value: Option<f64>,
    missing_value: Option<f64>,
}

impl Packing {
    fn unpack(&self, raw: f64) -> f64 {
        if self.fill_value == Some(raw) || self.missing_value == Some(raw) {
            return f64::NAN;
        }
        raw * self.scale_factor.unwrap_or(1.0) + self.add_offset.unwrap_or(0.0)
    }
}

/// First element of a numeric attribute, widened to f64.
fn attr_number(attr: &Attribute) -> Option<f64> {
    if let Some(v) = attr.get_f64() {
        return v.first().copied();
    }
    if let Some(v) = attr.get_f32() {
        return v.first().map(|&x| f64::from(x));
    }
    if let Some(v) = attr.get_i32() {
        return v.first().map(|&x| f64::from(x));
    }
    if let Some(v) = attr.get_i16() {
        return v.first().map(|&x| f64::from(x));
    }
    attr.get_i8().and_then(|v| v.first().map(|&x| f64::from(x)))
}

/// A parsed NetCDF classic file read from memory.
pub struct NetCdfFile {
    reader: FileReader,
}

impl std::fmt::Debug for NetCdfFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetCdfFile")
            .field("variables", &self.data_set().get_var_names())
            .finish()
    }
}

impl NetCdfFile {
    /// Parse the header. Variable data is read on demand.
    pub fn from_bytes(data: impl Into<Bytes>) -> NetCdfResult<Self> {
        let data = data.into();
        if !is_classic(&data) {
            return Err(NetCdfError::InvalidFormat(
                "missing NetCDF classic magic number".to_string(),
            ));
        }

        let reader = FileReader::open_seek_read("payload.nc", Box::new(Cursor::new(data)))
            .map_err(|e| NetCdfError::InvalidFormat(format!("unreadable NetCDF header: {:?}", e)))?;
        Ok(Self { reader })
    }

    pub fn data_set(&self) -> &DataSet {
        self.reader.data_set()
    }

    /// Header information for `name`, with the record dimension sized to the
    /// number of records actually present.
    pub fn variable(&self, name: &str) -> Option<VariableInfo> {
        let data_set = self.data_set();
        let var = data_set.get_var(name)?;
        let dimensions = var.dim_names();
        let shape = dimensions
            .iter()
            .map(|d| data_set.dim_size(d).unwrap_or(0))
            .collect();

        Some(VariableInfo {
            name: var.name().to_string(),
            dimensions,
            shape,
            data_type: var.data_type(),
        })
    }

    /// Every variable in header order.
    pub fn variables(&self) -> Vec<VariableInfo> {
        self.data_set()
            .get_var_names()
            .iter()
            .filter_map(|name| self.variable(name))
            .collect()
    }

    fn packing(&self, name: &str) -> Packing {
        let Some(var) = self.data_set().get_var(name) else {
            return Packing::default();
        };
        let number = |attr: &str| var.get_attr(attr).and_then(attr_number);

        Packing {
            scale_factor: number("scale_factor"),
            add_offset: number("add_offset"),
            fill_value: number("_FillValue"),
            missing_value: number("missing_value"),
        }
    }

    /// Stored values of `name` widened to f64, row-major.
    pub fn read_raw(&mut self, name: &str) -> NetCdfResult<Vec<f64>> {
        if self.data_set().get_var(name).is_none() {
            return Err(NetCdfError::MissingData(name.to_string()));
        }

        let data = self
            .reader
            .read_var(name)
            .map_err(|e| NetCdfError::InvalidFormat(format!("failed to read variable '{}': {:?}", name, e)))?;

        let values: Vec<f64> = match data {
            DataVector::I8(v) => v.into_iter().map(f64::from).collect(),
            DataVector::I16(v) => v.into_iter().map(f64::from).collect(),
            DataVector::I32(v) => v.into_iter().map(f64::from).collect(),
            DataVector::F32(v) => v.into_iter().map(f64::from).collect(),
            DataVector::F64(v) => v,
            DataVector::U8(_) => {
                return Err(NetCdfError::InvalidFormat(format!(
                    "variable '{}' holds characters, not numbers",
                    name
                )))
            }
        };

        trace!(variable = %name, len = values.len(), "Read variable");
        Ok(values)
    }

    /// Values of `name` with `scale_factor` and `add_offset` applied.
    /// `_FillValue` and `missing_value` become NaN.
    pub fn read_unpacked(&mut self, name: &str) -> NetCdfResult<Vec<f64>> {
        let packing = self.packing(name);
        let raw = self.read_raw(name)?;
        if packing == Packing::default() {
            return Ok(raw);
        }
        Ok(raw.into_iter().map(|v| packing.unpack(v)).collect())
    }
}
