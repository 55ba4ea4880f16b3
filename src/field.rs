use std::io::Write;

use crate::HashMap;

/// Per-element values of one field at one time step.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldBlock {
    pub time: f64,
    /// Number of values stored for every element.
    pub n_components: usize,
    pub values: HashMap<u32, Vec<f64>>,
}

/// All time steps of one field, keyed by time index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldData {
    blocks: HashMap<i32, FieldBlock>,
}

/// The fixed eight-line header of an `$ElementData` block.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDataHeader {
    pub field: String,
    pub time: f64,
    pub time_index: i32,
    pub n_components: usize,
    pub n_elements: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum FieldHeaderError {
    #[error("Expected {expected} {what} in element data header, found {found:?}")]
    TagCount {
        what: &'static str,
        expected: usize,
        found: String,
    },
    #[error("Cannot parse {what} in element data header: {line:?}")]
    Malformed { what: &'static str, line: String },
}

impl FieldBlock {
    pub fn new(time: f64, n_components: usize) -> Self {
        Self {
            time,
            n_components,
            values: HashMap::default(),
        }
    }

    pub fn get(&self, element_id: u32) -> Option<&[f64]> {
        self.values.get(&element_id).map(Vec::as_slice)
    }
}

impl FieldData {
    pub fn get(&self, time_index: i32) -> Option<&FieldBlock> {
        self.blocks.get(&time_index)
    }

    pub fn contains(&self, time_index: i32) -> bool {
        self.blocks.contains_key(&time_index)
    }

    /// Adds a block, handing it back if the time index is already taken.
    pub fn try_insert(
        &mut self,
        time_index: i32,
        block: FieldBlock,
    ) -> Result<(), FieldBlock> {
        if self.contains(time_index) {
            return Err(block);
        }
        self.blocks.insert(time_index, block);
        Ok(())
    }

    /// Time indices in ascending order.
    pub fn time_indices(&self) -> Vec<i32> {
        let mut r: Vec<i32> = self.blocks.keys().copied().collect();
        r.sort_unstable();
        r
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, &FieldBlock)> {
        self.blocks.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl ElementDataHeader {
    pub const N_LINES: usize = 8;

    /// Parses the header from its eight lines.
    ///
    /// Only the single string tag / single real tag / three integer tag
    /// layout is understood; any other tag count is rejected.
    pub fn parse(lines: &[String; Self::N_LINES]) -> Result<Self, FieldHeaderError> {
        expect_count(&lines[0], "string tags", 1)?;
        let field = lines[1].trim_matches('"').to_owned();
        expect_count(&lines[2], "real tags", 1)?;
        let time = first_token(&lines[3], "time value")?;
        expect_count(&lines[4], "integer tags", 3)?;
        let time_index = first_token(&lines[5], "time index")?;
        let n_components = first_token(&lines[6], "component count")?;
        let n_elements = first_token(&lines[7], "element count")?;
        Ok(Self {
            field,
            time,
            time_index,
            n_components,
            n_elements,
        })
    }

    pub fn write_to(&self, write: &mut dyn Write) -> std::io::Result<()> {
        writeln!(write, "1")?;
        writeln!(write, "\"{}\"", self.field)?;
        writeln!(write, "1")?;
        writeln!(write, "{}", self.time)?;
        writeln!(write, "3")?;
        writeln!(write, "{}", self.time_index)?;
        writeln!(write, "{}", self.n_components)?;
        writeln!(write, "{}", self.n_elements)
    }
}

fn first_token<T: std::str::FromStr>(
    line: &str,
    what: &'static str,
) -> Result<T, FieldHeaderError> {
    line.split_whitespace()
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| FieldHeaderError::Malformed {
            what,
            line: line.to_owned(),
        })
}

fn expect_count(
    line: &str,
    what: &'static str,
    expected: usize,
) -> Result<(), FieldHeaderError> {
    match first_token::<usize>(line, what) {
        Ok(n) if n == expected => Ok(()),
        _ => Err(FieldHeaderError::TagCount {
            what,
            expected,
            found: line.to_owned(),
        }),
    }
}
