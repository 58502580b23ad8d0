use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Longest row a sort case may hold.
pub const MAX_SORT_ARRAY_SIZE: usize = 11;

/// Smallest transmit buffer the serial path accepts.
pub const MIN_TX_BUFFER: u64 = 64;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuxiliaryPolicy {
    /// Swap status and swap count are reported but never fail a case.
    #[default]
    Informational,
    /// A wrong swap status or an implausible swap count fails the case.
    Enforced,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields, default)]
pub struct PacingConfig {
    pub case_period_ms: u64,
    pub idle_period_ms: u64,
    pub wait_timeout_ms: Option<u64>,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            case_period_ms: 50,
            idle_period_ms: 2000,
            wait_timeout_ms: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields, default)]
pub struct SerialConfig {
    pub tx_buffer: String, // e.g. "1KiB"
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            tx_buffer: "1KiB".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields, default)]
pub struct ScoringConfig {
    pub swap_points_max: u32,
    pub sort_points_max: u32,
    pub auxiliary_policy: AuxiliaryPolicy,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            swap_points_max: 25,
            sort_points_max: 25,
            auxiliary_policy: AuxiliaryPolicy::Informational,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields, default)]
pub struct DebugConfig {
    pub verbose: bool,
    pub break_on_case: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct HarnessConfig {
    pub schema_version: String,
    #[serde(default = "default_student_name")]
    pub student_name: String,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub debug: DebugConfig,
    #[serde(default)]
    pub corpus: Option<String>,
}

fn default_student_name() -> String {
    "YOUR NAME".to_string()
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            schema_version: "1.0".to_string(),
            student_name: default_student_name(),
            pacing: PacingConfig::default(),
            serial: SerialConfig::default(),
            scoring: ScoringConfig::default(),
            debug: DebugConfig::default(),
            corpus: None,
        }
    }
}

impl HarnessConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = std::fs::File::open(&path)
            .with_context(|| format!("Failed to open harness config at {:?}", path.as_ref()))?;
        let config: Self =
            serde_yaml::from_reader(f).context("Failed to parse Harness Config YAML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema_version != "1.0" {
            anyhow::bail!(
                "Unsupported schema_version '{}'. Supported versions: '1.0'",
                self.schema_version
            );
        }

        if self.scoring.swap_points_max == 0 || self.scoring.sort_points_max == 0 {
            anyhow::bail!("Scoring 'swap_points_max' and 'sort_points_max' must be greater than zero");
        }

        let tx = self.tx_buffer_len()?;
        if tx < MIN_TX_BUFFER {
            anyhow::bail!(
                "Serial 'tx_buffer' must be at least {} bytes, got {}",
                MIN_TX_BUFFER,
                tx
            );
        }

        Ok(())
    }

    /// Transmit buffer size in bytes.
    pub fn tx_buffer_len(&self) -> Result<u64> {
        parse_size(&self.serial.tx_buffer)
    }

    /// Corpus path, resolved against the directory holding the config file.
    pub fn corpus_path(&self, config_path: &Path) -> Option<PathBuf> {
        self.corpus.as_ref().map(|c| {
            config_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(c)
        })
    }
}

/// Fixed test tables for both operation families.
///
/// Values are stored wide so that both `-1` and `0x80000001` can be written
/// as-is; the driver truncates them to the active element width.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TestCorpus {
    pub swap_cases: Vec<[i64; 2]>,
    pub sort_cases: Vec<Vec<i64>>,
}

impl Default for TestCorpus {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TestCorpus {
    /// The lab's stock tables.
    pub fn builtin() -> Self {
        let swap_cases = vec![
            [0x0203, 0x0302],
            [0x8000_0001, 0x0000_0001],
            [0, 0],
            [1, 2],
            [2, 1],
        ];

        let sort_cases = vec![
            vec![79, 69, 59, 78, 68, 58, 75, 65, 45, -1, 0],
            vec![2, 1, 0, 6, 0, 1, 2, 3, 4, 5, 6],
            vec![9, 8, 7, 6, 0, 1, 2, 3, 4, 5, 6],
            vec![0; MAX_SORT_ARRAY_SIZE],
            vec![
                32768, 1, 0, 0x0011_22AA, 0x0011_22AA, 0x0011_22AA, 0x0011_22AA, 0x0011_22AA,
                0x0011_22AA, 0x0011_22AA, 0x0011_22AA,
            ],
            vec![
                0x8000_0001, 0x8001_1000, 0x8001_0001, 0x8001_1001, 0x7001_09A0, 0x7FED_4000,
                0x6000_0000, 0, 0x1111_1111, 0x2222_2222, 0x3333_3333,
            ],
            vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 0, 0],
            // Ten initializers in a fixed eleven-slot row; the last slot is zero.
            vec![-1, -2, -3, 0, 9, 10, 11, 12, 13, 15, 0],
        ];

        Self {
            swap_cases,
            sort_cases,
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = std::fs::File::open(&path)
            .with_context(|| format!("Failed to open test corpus at {:?}", path.as_ref()))?;
        let corpus: Self =
            serde_yaml::from_reader(f).context("Failed to parse Test Corpus YAML")?;
        corpus.validate()?;
        Ok(corpus)
    }

    pub fn validate(&self) -> Result<()> {
        if self.swap_cases.is_empty() {
            anyhow::bail!("Corpus 'swap_cases' cannot be empty");
        }

        if self.sort_cases.is_empty() {
            anyhow::bail!("Corpus 'sort_cases' cannot be empty");
        }

        for (i, row) in self.sort_cases.iter().enumerate() {
            if row.is_empty() {
                anyhow::bail!("Sort case {} has no elements", i);
            }
            if row.len() > MAX_SORT_ARRAY_SIZE {
                anyhow::bail!(
                    "Sort case {} has {} elements; at most {} are allowed",
                    i,
                    row.len(),
                    MAX_SORT_ARRAY_SIZE
                );
            }
        }

        Ok(())
    }
}

pub fn parse_size(size_str: &str) -> Result<u64> {
    use human_size::{Byte, Size, SpecificSize};
    let s: Size = size_str
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid size format: {}", e))?;
    let bytes: SpecificSize<Byte> = s.into();
    Ok(bytes.value() as u64)
}
