//! Low-level Parquet reading and column extraction.

use std::path::Path;

use arrow::array::{Array, AsArray, PrimitiveArray, RecordBatch, StringArray};
use arrow::datatypes::{
    ArrowPrimitiveType, Float64Type, Int32Type, Int64Type, UInt8Type, UInt32Type,
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::error::IoError;
use crate::records::{AdminCode, Granularity, GridPoint, Location, PixelId};

/// Reads all record batches from a Parquet file.
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`] if the file does not exist, or
/// [`IoError::Parquet`] if the file cannot be opened or read.
pub(crate) fn read_batches(path: &Path) -> Result<Vec<RecordBatch>, IoError> {
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let file = std::fs::File::open(path).map_err(|e| IoError::Parquet {
        reason: format!("{}: {e}", path.display()),
    })?;

    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let reader = builder.build()?;

    let batches: Vec<RecordBatch> = reader.collect::<Result<Vec<_>, _>>()?;

    Ok(batches)
}

/// Name-based column access on one record batch.
pub(crate) struct Columns<'a> {
    batch: &'a RecordBatch,
    path: &'a Path,
}

impl<'a> Columns<'a> {
    pub(crate) fn new(batch: &'a RecordBatch, path: &'a Path) -> Self {
        Self { batch, path }
    }

    pub(crate) fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub(crate) fn has(&self, name: &str) -> bool {
        self.batch.column_by_name(name).is_some()
    }

    fn missing(&self, name: &str) -> IoError {
        IoError::MissingColumn {
            column: name.to_string(),
            path: self.path.to_path_buf(),
        }
    }

    fn primitive<T: ArrowPrimitiveType>(
        &self,
        name: &str,
    ) -> Result<&'a PrimitiveArray<T>, IoError> {
        let column = self
            .batch
            .column_by_name(name)
            .ok_or_else(|| self.missing(name))?;
        column
            .as_primitive_opt::<T>()
            .ok_or_else(|| IoError::Validation {
                count: 1,
                details: format!(
                    "column '{name}' in {} has type {}, expected {}",
                    self.path.display(),
                    column.data_type(),
                    T::DATA_TYPE
                ),
            })
    }

    pub(crate) fn i64(&self, name: &str) -> Result<&'a PrimitiveArray<Int64Type>, IoError> {
        self.primitive::<Int64Type>(name)
    }

    pub(crate) fn i32(&self, name: &str) -> Result<&'a PrimitiveArray<Int32Type>, IoError> {
        self.primitive::<Int32Type>(name)
    }

    pub(crate) fn u32(&self, name: &str) -> Result<&'a PrimitiveArray<UInt32Type>, IoError> {
        self.primitive::<UInt32Type>(name)
    }

    pub(crate) fn u8(&self, name: &str) -> Result<&'a PrimitiveArray<UInt8Type>, IoError> {
        self.primitive::<UInt8Type>(name)
    }

    pub(crate) fn f64(&self, name: &str) -> Result<&'a PrimitiveArray<Float64Type>, IoError> {
        self.primitive::<Float64Type>(name)
    }

    /// Several `Float64` columns, in the given order.
    pub(crate) fn f64_many(
        &self,
        names: &[String],
    ) -> Result<Vec<&'a PrimitiveArray<Float64Type>>, IoError> {
        names.iter().map(|n| self.f64(n)).collect()
    }

    pub(crate) fn utf8(&self, name: &str) -> Result<&'a StringArray, IoError> {
        let column = self
            .batch
            .column_by_name(name)
            .ok_or_else(|| self.missing(name))?;
        column
            .as_string_opt::<i32>()
            .ok_or_else(|| IoError::Validation {
                count: 1,
                details: format!(
                    "column '{name}' in {} has type {}, expected Utf8",
                    self.path.display(),
                    column.data_type()
                ),
            })
    }

    /// Decode the location key columns for `granularity`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::GranularityMismatch`] when the table carries the
    /// other granularity's key, and [`IoError::MissingColumn`] when neither
    /// key is present.
    pub(crate) fn locations(&self, granularity: Granularity) -> Result<Vec<Location>, IoError> {
        match granularity {
            Granularity::Pixel => {
                if !self.has("pixel_geom_id") && self.has("adm_pcode") {
                    return Err(IoError::GranularityMismatch {
                        expected: Granularity::Pixel,
                        found: Granularity::Admin,
                    });
                }
                let ids = self.i64("pixel_geom_id")?;
                let lats = self.f64("latitude")?;
                let lons = self.f64("longitude")?;
                Ok((0..self.num_rows())
                    .map(|i| {
                        Location::Pixel(GridPoint::from_parts(
                            PixelId::from_raw(ids.value(i)),
                            lats.value(i),
                            lons.value(i),
                        ))
                    })
                    .collect())
            }
            Granularity::Admin => {
                if !self.has("adm_pcode") && self.has("pixel_geom_id") {
                    return Err(IoError::GranularityMismatch {
                        expected: Granularity::Admin,
                        found: Granularity::Pixel,
                    });
                }
                let codes = self.utf8("adm_pcode")?;
                Ok((0..self.num_rows())
                    .map(|i| Location::Admin(AdminCode::new(codes.value(i))))
                    .collect())
            }
        }
    }
}

/// Value at `row`, or `None` when null.
pub(crate) fn nullable(column: &PrimitiveArray<Float64Type>, row: usize) -> Option<f64> {
    if column.is_null(row) {
        None
    } else {
        Some(column.value(row))
    }
}
