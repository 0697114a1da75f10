//! NetCDF classic payloads for decoder tests.
//!
//! Wraps `netcdf3`'s writer in a builder so a fixture reads as one
//! expression. Files are written to a scratch directory and returned as
//! bytes, the way they arrive from an upstream feed.
//!
//! ```
//! use test_utils::netcdf::{ClassicFileBuilder, NcValues};
//!
//! let bytes = ClassicFileBuilder::new()
//!     .dimension("cell", 2)
//!     .variable("precipitation", &["cell"], NcValues::Float(vec![1.0, 2.0]))
//!     .build();
//! assert_eq!(&bytes[..4], b"CDF\x01");
//! ```

use netcdf3::{DataSet, FileWriter, Version};

/// Variable payload in its on-disk type.
#[derive(Debug, Clone, PartialEq)]
pub enum NcValues {
    Byte(Vec<i8>),
    Short(Vec<i16>),
    Int(Vec<i32>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

/// Attribute payload.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    Short(Vec<i16>),
    Int(Vec<i32>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

#[derive(Debug, Clone)]
struct Dim {
    name: String,
    len: usize,
    is_record: bool,
}

#[derive(Debug, Clone)]
struct Var {
    name: String,
    dims: Vec<String>,
    attrs: Vec<(String, AttrValue)>,
    values: NcValues,
}

/// Builder for an in-memory NetCDF classic file.
#[derive(Debug, Clone, Default)]
pub struct ClassicFileBuilder {
    offset64: bool,
    dims: Vec<Dim>,
    globals: Vec<(String, AttrValue)>,
    vars: Vec<Var>,
}

impl ClassicFileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a CDF-2 (64-bit offset) file.
    pub fn offset64(mut self) -> Self {
        self.offset64 = true;
        self
    }

    pub fn dimension(mut self, name: &str, len: usize) -> Self {
        self.dims.push(Dim {
            name: name.to_string(),
            len,
            is_record: false,
        });
        self
    }

    /// The unlimited dimension, holding `numrecs` records.
    pub fn record_dimension(mut self, name: &str, numrecs: usize) -> Self {
        self.dims.push(Dim {
            name: name.to_string(),
            len: numrecs,
            is_record: true,
        });
        self
    }

    pub fn global_attribute(mut self, name: &str, value: AttrValue) -> Self {
        self.globals.push((name.to_string(), value));
        self
    }

    /// Add a variable. Values are row-major over `dims`.
    pub fn variable(mut self, name: &str, dims: &[&str], values: NcValues) -> Self {
        for d in dims {
            if !self.dims.iter().any(|known| known.name == *d) {
                panic!("unknown dimension '{}' for variable '{}'", d, name);
            }
        }
        self.vars.push(Var {
            name: name.to_string(),
            dims: dims.iter().map(|d| d.to_string()).collect(),
            attrs: Vec::new(),
            values,
        });
        self
    }

    /// Attach an attribute to a previously added variable.
    pub fn attribute(mut self, variable: &str, name: &str, value: AttrValue) -> Self {
        let var = self
            .vars
            .iter_mut()
            .find(|v| v.name == variable)
            .unwrap_or_else(|| panic!("unknown variable '{}'", variable));
        var.attrs.push((name.to_string(), value));
        self
    }

    fn data_set(&self) -> DataSet {
        let mut data_set = DataSet::new();

        for dim in &self.dims {
            let added = if dim.is_record {
                data_set.set_unlimited_dim(&dim.name, dim.len)
            } else {
                data_set.add_fixed_dim(&dim.name, dim.len)
            };
            added.unwrap_or_else(|e| panic!("invalid dimension '{}': {:?}", dim.name, e));
        }

        for (name, value) in &self.globals {
            let added = match value {
                AttrValue::Text(s) => data_set.add_global_attr_string(name, s),
                AttrValue::Short(v) => data_set.add_global_attr_i16(name, v.clone()),
                AttrValue::Int(v) => data_set.add_global_attr_i32(name, v.clone()),
                AttrValue::Float(v) => data_set.add_global_attr_f32(name, v.clone()),
                AttrValue::Double(v) => data_set.add_global_attr_f64(name, v.clone()),
            };
            added.unwrap_or_else(|e| panic!("invalid global attribute '{}': {:?}", name, e));
        }

        for var in &self.vars {
            let dims: Vec<&str> = var.dims.iter().map(String::as_str).collect();
            let added = match var.values {
                NcValues::Byte(_) => data_set.add_var_i8(&var.name, &dims),
                NcValues::Short(_) => data_set.add_var_i16(&var.name, &dims),
                NcValues::Int(_) => data_set.add_var_i32(&var.name, &dims),
                NcValues::Float(_) => data_set.add_var_f32(&var.name, &dims),
                NcValues::Double(_) => data_set.add_var_f64(&var.name, &dims),
            };
            added.unwrap_or_else(|e| panic!("invalid variable '{}': {:?}", var.name, e));

            for (attr, value) in &var.attrs {
                let added = match value {
                    AttrValue::Text(s) => data_set.add_var_attr_string(&var.name, attr, s),
                    AttrValue::Short(v) => data_set.add_var_attr_i16(&var.name, attr, v.clone()),
                    AttrValue::Int(v) => data_set.add_var_attr_i32(&var.name, attr, v.clone()),
                    AttrValue::Float(v) => data_set.add_var_attr_f32(&var.name, attr, v.clone()),
                    AttrValue::Double(v) => data_set.add_var_attr_f64(&var.name, attr, v.clone()),
                };
                added.unwrap_or_else(|e| panic!("invalid attribute '{}:{}': {:?}", var.name, attr, e));
            }
        }

        data_set
    }

    pub fn build(&self) -> Vec<u8> {
        let data_set = self.data_set();
        let version = if self.offset64 {
            Version::Offset64Bit
        } else {
            Version::Classic
        };

        let dir = tempfile::tempdir().expect("Failed to create fixture directory");
        let path = dir.path().join("fixture.nc");

        let mut writer = FileWriter::open(&path).expect("Failed to open fixture file");
        writer.set_def(&data_set, version, 0).expect("Failed to write fixture header");
        for var in &self.vars {
            let written = match &var.values {
                NcValues::Byte(v) => writer.write_var_i8(&var.name, v),
                NcValues::Short(v) => writer.write_var_i16(&var.name, v),
                NcValues::Int(v) => writer.write_var_i32(&var.name, v),
                NcValues::Float(v) => writer.write_var_f32(&var.name, v),
                NcValues::Double(v) => writer.write_var_f64(&var.name, v),
            };
            written.unwrap_or_else(|e| panic!("Failed to write variable '{}': {:?}", var.name, e));
        }
        writer.close().expect("Failed to finish fixture file");

        std::fs::read(&path).expect("Failed to read fixture file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_magic() {
        let bytes = ClassicFileBuilder::new()
            .dimension("cell", 3)
            .variable("p", &["cell"], NcValues::Short(vec![1, 2, 3]))
            .build();
        assert_eq!(&bytes[..4], b"CDF\x01");
        assert_eq!(bytes.len() % 4, 0);
    }

    #[test]
    fn test_offset64_magic() {
        let bytes = ClassicFileBuilder::new()
            .offset64()
            .dimension("cell", 1)
            .variable("p", &["cell"], NcValues::Double(vec![1.0]))
            .build();
        assert_eq!(&bytes[..4], b"CDF\x02");
    }

    #[test]
    #[should_panic(expected = "unknown dimension")]
    fn test_unknown_dimension_panics() {
        let _ = ClassicFileBuilder::new().variable("p", &["time"], NcValues::Float(vec![]));
    }
}
