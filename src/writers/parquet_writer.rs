use crate::error::{ProcessingError, Result};
use crate::models::GlobalAnnualAnomaly;
use crate::utils::constants::{
    ANOMALY_COLUMN, COMPRESSION_GZIP, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_ROW_GROUP_SIZE, YEAR_COLUMN,
};
use arrow::array::{Array, Float64Array, Int32Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use parquet::file::reader::{FileReader, SerializedFileReader};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

pub struct ParquetWriter {
    compression: Compression,
    value_column: String,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            value_column: ANOMALY_COLUMN.to_string(),
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            "lz4" => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_value_column(mut self, name: &str) -> Self {
        self.value_column = name.to_string();
        self
    }

    /// Write an annual series as two columns, `year` (Int32) and the value (Float64)
    pub fn write_series(&self, series: &[GlobalAnnualAnomaly], path: &Path) -> Result<()> {
        let schema = self.create_schema();
        let batch = Self::series_to_batch(series, schema.clone())?;

        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(DEFAULT_ROW_GROUP_SIZE)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
        writer.write(&batch)?;
        writer.close()?;

        Ok(())
    }

    fn create_schema(&self) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new(YEAR_COLUMN, DataType::Int32, false),
            Field::new(self.value_column.as_str(), DataType::Float64, false),
        ]))
    }

    fn series_to_batch(
        series: &[GlobalAnnualAnomaly],
        schema: Arc<Schema>,
    ) -> Result<RecordBatch> {
        let years = Int32Array::from_iter_values(series.iter().map(|point| point.year));
        let anomalies = Float64Array::from_iter_values(series.iter().map(|point| point.anomaly));

        let batch = RecordBatch::try_new(schema, vec![Arc::new(years), Arc::new(anomalies)])?;
        Ok(batch)
    }

    /// Read back a series written by `write_series`, whatever its value column
    pub fn read_series(&self, path: &Path) -> Result<Vec<GlobalAnnualAnomaly>> {
        let file = File::open(path)?;
        let parquet_reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

        let mut series = Vec::new();
        for batch_result in parquet_reader {
            let batch = batch_result?;
            if batch.num_columns() < 2 {
                return Err(ProcessingError::InvalidFormat(format!(
                    "expected year and value columns in {}",
                    path.display()
                )));
            }

            let years = batch
                .column(0)
                .as_any()
                .downcast_ref::<Int32Array>()
                .ok_or_else(|| {
                    ProcessingError::InvalidFormat("Invalid year column type".to_string())
                })?;
            let anomalies = batch
                .column(1)
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(|| {
                    ProcessingError::InvalidFormat("Invalid value column type".to_string())
                })?;

            for i in 0..batch.num_rows() {
                if years.is_null(i) || anomalies.is_null(i) {
                    continue;
                }
                series.push(GlobalAnnualAnomaly::new(years.value(i), anomalies.value(i)));
            }
        }

        Ok(series)
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let row_groups = metadata.num_row_groups();
        let total_rows = metadata.file_metadata().num_rows();
        let file_size = std::fs::metadata(path)?.len();

        let compression = if row_groups > 0 && metadata.row_group(0).num_columns() > 0 {
            metadata.row_group(0).column(0).compression()
        } else {
            self.compression
        };

        Ok(ParquetFileInfo {
            total_rows,
            row_groups: row_groups as i32,
            file_size,
            compression,
        })
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub file_size: u64,
    pub compression: Compression,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} KB\n\
            - Compression: {:?}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1024.0,
            self.compression,
        )
    }
}
