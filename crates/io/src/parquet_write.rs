//! Low-level Parquet column building.

use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    ArrayRef, Float64Array, Int32Array, Int64Array, RecordBatch, StringArray, UInt8Array,
    UInt32Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;

use crate::error::IoError;
use crate::records::{Granularity, Location};

/// Column-by-column builder for one pipeline table.
///
/// Columns are appended in schema order; [`TableBuilder::finish`] checks
/// that every column has the same length.
#[derive(Default)]
pub(crate) struct TableBuilder {
    fields: Vec<Field>,
    columns: Vec<ArrayRef>,
}

impl TableBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn push(mut self, name: &str, data_type: DataType, nullable: bool, column: ArrayRef) -> Self {
        self.fields.push(Field::new(name, data_type, nullable));
        self.columns.push(column);
        self
    }

    /// Append the location key columns for `granularity`:
    /// `pixel_geom_id, latitude, longitude` or `adm_pcode`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::GranularityMismatch`] if a location belongs to the
    /// other granularity.
    pub(crate) fn locations<'a>(
        self,
        granularity: Granularity,
        locations: impl Iterator<Item = &'a Location>,
    ) -> Result<Self, IoError> {
        match granularity {
            Granularity::Pixel => {
                let mut ids = Vec::new();
                let mut lats = Vec::new();
                let mut lons = Vec::new();
                for loc in locations {
                    let Location::Pixel(p) = loc else {
                        return Err(IoError::GranularityMismatch {
                            expected: granularity,
                            found: loc.granularity(),
                        });
                    };
                    ids.push(p.id().get());
                    lats.push(p.latitude());
                    lons.push(p.longitude());
                }
                Ok(self
                    .i64("pixel_geom_id", ids)
                    .f64("latitude", lats)
                    .f64("longitude", lons))
            }
            Granularity::Admin => {
                let mut codes = Vec::new();
                for loc in locations {
                    let Location::Admin(code) = loc else {
                        return Err(IoError::GranularityMismatch {
                            expected: granularity,
                            found: loc.granularity(),
                        });
                    };
                    codes.push(code.as_str().to_string());
                }
                Ok(self.utf8("adm_pcode", codes))
            }
        }
    }

    pub(crate) fn i64(self, name: &str, values: Vec<i64>) -> Self {
        self.push(name, DataType::Int64, false, Arc::new(Int64Array::from(values)))
    }

    pub(crate) fn i32(self, name: &str, values: Vec<i32>) -> Self {
        self.push(name, DataType::Int32, false, Arc::new(Int32Array::from(values)))
    }

    pub(crate) fn u32(self, name: &str, values: Vec<u32>) -> Self {
        self.push(name, DataType::UInt32, false, Arc::new(UInt32Array::from(values)))
    }

    pub(crate) fn u8(self, name: &str, values: Vec<u8>) -> Self {
        self.push(name, DataType::UInt8, false, Arc::new(UInt8Array::from(values)))
    }

    pub(crate) fn f64(self, name: &str, values: Vec<f64>) -> Self {
        self.push(name, DataType::Float64, false, Arc::new(Float64Array::from(values)))
    }

    /// Nullable `Float64` column; `None` is written as null.
    pub(crate) fn opt_f64(self, name: &str, values: Vec<Option<f64>>) -> Self {
        self.push(name, DataType::Float64, true, Arc::new(Float64Array::from(values)))
    }

    pub(crate) fn utf8(self, name: &str, values: Vec<String>) -> Self {
        self.push(name, DataType::Utf8, false, Arc::new(StringArray::from(values)))
    }

    /// Assemble the schema and a single record batch.
    pub(crate) fn finish(self) -> Result<(Arc<Schema>, RecordBatch), IoError> {
        let schema = Arc::new(Schema::new(self.fields));
        let batch = RecordBatch::try_new(schema.clone(), self.columns)?;
        Ok((schema, batch))
    }
}

/// Writes a sequence of [`RecordBatch`]es to a Parquet file at `path`.
///
/// # Errors
///
/// Returns [`IoError::Parquet`] if file creation, batch writing, or file
/// finalisation fails.
pub(crate) fn write_batches(
    path: &Path,
    batches: &[RecordBatch],
    schema: Arc<Schema>,
    props: WriterProperties,
) -> Result<(), IoError> {
    let file = std::fs::File::create(path).map_err(|e| IoError::Parquet {
        reason: format!("{}: {e}", path.display()),
    })?;
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;

    for batch in batches {
        writer.write(batch)?;
    }

    writer.close()?;
    Ok(())
}
