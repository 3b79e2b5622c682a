//! The compact-id ↔ dense-index bijection and neighbour tables.
//!
//! [`IdentifierHelper`] is built once from a [`RangeDictionary`] and is
//! immutable afterwards; every query is a lock-free read and the helper
//! may be shared freely across threads behind an `Arc`.
//!
//! # Packing
//!
//! Fields are packed most-significant first: field 0 owns the top bits,
//! the last field the lowest. Each field value is translated into a code
//! that preserves value order (offset from the smallest legal value, or
//! rank among the legal values when the legal set has gaps), so sorting
//! compact ids sorts expanded ids lexicographically.

use std::sync::Arc;

use detgeo_core::{
    CompactId, DenseIndex, Direction, ExpandedId, FieldCodec, RangeError, SchemaError,
};
use smallvec::SmallVec;

use crate::config::{IdentifierConfig, RangeCheck};
use crate::dictionary::RangeDictionary;
use crate::neighbours::NeighbourTable;
use crate::range::span_len;

/// Order-preserving translation between field values and codes.
#[derive(Clone, Debug, PartialEq, Eq)]
enum ValueEncoding {
    /// Code is `value - min`; the legal set is one contiguous interval.
    Offset { min: i32 },
    /// Code is the value's rank across disjoint intervals; `starts[k]`
    /// is the code of `spans[k].0`.
    Intervals {
        spans: Vec<(i32, i32)>,
        starts: Vec<u64>,
    },
}

impl ValueEncoding {
    /// Encode without validation. Illegal values still produce a
    /// deterministic code, which may alias a legal one.
    fn encode(&self, value: i32) -> u64 {
        match self {
            Self::Offset { min } => (value as i64).wrapping_sub(*min as i64) as u64,
            Self::Intervals { spans, starts } => {
                let k = spans.partition_point(|&(_, hi)| hi < value);
                match spans.get(k) {
                    Some(&(lo, _)) if value >= lo => starts[k] + span_len(lo, value) - 1,
                    Some(_) => starts[k],
                    None => match (spans.last(), starts.last()) {
                        (Some(&(lo, hi)), Some(&start)) => start + span_len(lo, hi),
                        _ => 0,
                    },
                }
            }
        }
    }

    fn decode(&self, code: u64) -> Option<i32> {
        match self {
            Self::Offset { min } => i32::try_from(*min as i64 + i64::try_from(code).ok()?).ok(),
            Self::Intervals { spans, starts } => {
                let k = starts.partition_point(|&s| s <= code).checked_sub(1)?;
                let (lo, hi) = spans[k];
                let offset = code - starts[k];
                (offset < span_len(lo, hi)).then(|| (lo as i64 + offset as i64) as i32)
            }
        }
    }

    fn from_intervals(spans: Vec<(i32, i32)>) -> Self {
        match spans.as_slice() {
            [] => Self::Offset { min: 0 },
            [(min, _)] => Self::Offset { min: *min },
            _ => {
                let starts = spans
                    .iter()
                    .scan(0u64, |next, &(lo, hi)| {
                        let start = *next;
                        *next += span_len(lo, hi);
                        Some(start)
                    })
                    .collect();
                Self::Intervals { spans, starts }
            }
        }
    }
}

/// Codec plus value encoding for one field.
#[derive(Clone, Debug)]
struct FieldLayout {
    codec: FieldCodec,
    encoding: ValueEncoding,
}

/// Bits needed to distinguish `cardinality` codes.
fn bits_for(cardinality: u64) -> u32 {
    if cardinality <= 1 {
        0
    } else {
        u64::BITS - (cardinality - 1).leading_zeros()
    }
}

/// Builds and serves the compact-id ↔ dense-index bijection at one
/// hierarchy level, plus the schema-derived neighbour tables.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use detgeo_core::{DenseIndex, Direction};
/// use detgeo_ident::{
///     DictionarySchema, FieldDef, FieldRange, IdentifierConfig, IdentifierHelper,
///     RangeDictionary,
/// };
///
/// let dict = RangeDictionary::from_schema(
///     DictionarySchema::new()
///         .field(FieldDef::new("row"))
///         .field(FieldDef::new("module"))
///         .region(vec![FieldRange::bounded(0, 1), FieldRange::bounded(0, 1)]),
/// )
/// .unwrap();
/// let helper = IdentifierHelper::new(
///     Arc::new(dict),
///     IdentifierConfig::new("module").eta("row").phi("module"),
/// )
/// .unwrap();
///
/// assert_eq!(helper.len(), 4);
/// let id = helper.compose(&[1, 0]).unwrap();
/// assert_eq!(helper.hash_of(id), Some(DenseIndex(2)));
/// assert_eq!(helper.neighbour(DenseIndex(0), Direction::NextEta), Some(DenseIndex(2)));
/// ```
#[derive(Clone, Debug)]
pub struct IdentifierHelper {
    dictionary: Arc<RangeDictionary>,
    layouts: Vec<FieldLayout>,
    hash_level: usize,
    eta_field: Option<usize>,
    phi_field: Option<usize>,
    range_check: RangeCheck,
    /// Sorted compact ids; position = dense index.
    table: Vec<CompactId>,
    neighbours: NeighbourTable,
}

// Compile-time assertion: IdentifierHelper must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<IdentifierHelper>();
};

impl IdentifierHelper {
    /// Build codecs, the dense-index table and the neighbour tables.
    ///
    /// Fails with a [`SchemaError`] if a configured field is unknown, the
    /// packed width exceeds 64 bits, the dictionary enumerates no ids at
    /// the hash level, or two distinct expanded ids collapse onto the
    /// same compact id. Nothing is published on failure.
    pub fn new(
        dictionary: Arc<RangeDictionary>,
        config: IdentifierConfig,
    ) -> Result<Self, SchemaError> {
        let result = Self::build(dictionary, config);
        if let Err(e) = &result {
            tracing::warn!(error = %e, "identifier helper construction failed");
        }
        result
    }

    fn build(
        dictionary: Arc<RangeDictionary>,
        config: IdentifierConfig,
    ) -> Result<Self, SchemaError> {
        let hash_level = dictionary.require_field(&config.hash_level)?;
        let eta_field = config
            .eta_field
            .as_deref()
            .map(|name| dictionary.require_field(name))
            .transpose()?;
        let phi_field = config
            .phi_field
            .as_deref()
            .map(|name| dictionary.require_field(name))
            .transpose()?;

        let layouts = Self::build_layouts(&dictionary)?;

        let mut helper = Self {
            dictionary,
            layouts,
            hash_level,
            eta_field,
            phi_field,
            range_check: config.range_check,
            table: Vec::new(),
            neighbours: NeighbourTable::new(0),
        };

        helper.table = helper.build_table()?;
        helper.neighbours = helper.build_neighbour_tables();

        tracing::info!(
            fields = helper.layouts.len(),
            hash_level = helper.hash_level,
            entries = helper.table.len(),
            "identifier helper initialized"
        );
        Ok(helper)
    }

    /// One codec per field, widths derived from the dictionary unless
    /// declared explicitly, packed most-significant first.
    fn build_layouts(dictionary: &RangeDictionary) -> Result<Vec<FieldLayout>, SchemaError> {
        let mut layouts = Vec::with_capacity(dictionary.field_count());
        let mut used: u32 = 0;
        for (level, field) in dictionary.fields().iter().enumerate() {
            let intervals = dictionary.value_intervals(level);
            let cardinality: u64 = intervals.iter().map(|&(lo, hi)| span_len(lo, hi)).sum();
            let encoding = ValueEncoding::from_intervals(intervals);
            let width = field.bits.unwrap_or_else(|| bits_for(cardinality));
            used = used.saturating_add(width);
            if used > FieldCodec::MAX_BITS {
                return Err(SchemaError::WidthOverflow {
                    total_bits: used,
                    max: FieldCodec::MAX_BITS,
                });
            }
            let codec = FieldCodec::new(FieldCodec::MAX_BITS - used, width)?;
            layouts.push(FieldLayout { codec, encoding });
        }
        Ok(layouts)
    }

    /// Enumerate the hash level, pack, sort, and reject collisions.
    fn build_table(&self) -> Result<Vec<CompactId>, SchemaError> {
        let mut packed: Vec<(CompactId, ExpandedId)> = self
            .dictionary
            .enumerate(self.hash_level)
            .map(|expanded| (self.pack_unchecked(&expanded), expanded))
            .collect();
        if packed.is_empty() {
            return Err(SchemaError::EmptyEnumeration);
        }
        if packed.len() > MAX_TABLE_LEN {
            return Err(SchemaError::TableTooLarge {
                entries: packed.len(),
            });
        }
        packed.sort_by(|a, b| a.0.cmp(&b.0));

        for pair in packed.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(SchemaError::DuplicateCompactId {
                    id: pair[0].0.raw(),
                    first: self.format_values(&pair[0].1),
                    second: self.format_values(&pair[1].1),
                });
            }
        }
        Ok(packed.into_iter().map(|(id, _)| id).collect())
    }

    /// Derive prev/next eta and phi neighbours for every table entry.
    ///
    /// A pure function of the dictionary: for each entry the dictionary
    /// is asked for the previous/next legal value of the neighbour field
    /// with every other field held fixed; the result is composed and
    /// hashed. Unresolved slots keep the sentinel.
    pub fn build_neighbour_tables(&self) -> NeighbourTable {
        let mut table = NeighbourTable::new(self.table.len());
        let depth = self.hash_level + 1;
        let axes = [
            (self.eta_field, Direction::PrevEta, Direction::NextEta),
            (self.phi_field, Direction::PrevPhi, Direction::NextPhi),
        ];

        for (i, &id) in self.table.iter().enumerate() {
            let index = DenseIndex(i as u32);
            let Some(expanded) = self.expand(id, depth) else {
                continue;
            };
            for (field, prev_dir, next_dir) in axes {
                let Some(field) = field.filter(|&f| f < depth) else {
                    continue;
                };
                let steps = [
                    (prev_dir, self.dictionary.prev_value(&expanded, field)),
                    (next_dir, self.dictionary.next_value(&expanded, field)),
                ];
                for (dir, value) in steps {
                    let Some(value) = value else { continue };
                    let mut neighbour = expanded.clone();
                    neighbour[field] = value;
                    if let Some(target) = self.hash_of(self.pack_unchecked(&neighbour)) {
                        table.set(index, dir, target);
                    }
                }
            }
        }

        tracing::debug!(
            entries = table.len(),
            next_eta = table.resolved(Direction::NextEta),
            next_phi = table.resolved(Direction::NextPhi),
            "neighbour tables built"
        );
        table
    }

    fn pack_unchecked(&self, values: &[i32]) -> CompactId {
        values
            .iter()
            .zip(&self.layouts)
            .fold(CompactId::ZERO, |id, (&value, layout)| {
                layout
                    .codec
                    .pack(layout.encoding.encode(value), id)
            })
    }

    /// Pack `values` (outermost field first) into a compact id.
    ///
    /// Under [`RangeCheck::Checked`] every value is validated against the
    /// dictionary under its parent prefix first; the first illegal field
    /// is reported with its legal range. Under [`RangeCheck::Unchecked`]
    /// this is [`compose_unchecked`](Self::compose_unchecked).
    pub fn compose(&self, values: &[i32]) -> Result<CompactId, RangeError> {
        if values.len() > self.layouts.len() {
            return Err(RangeError::TooManyFields {
                given: values.len(),
                max: self.layouts.len(),
            });
        }
        if self.range_check == RangeCheck::Checked {
            self.validate(values)?;
        }
        Ok(self.pack_unchecked(values))
    }

    /// Pack `values` without consulting the dictionary.
    ///
    /// Illegal values silently produce an out-of-range id. Values beyond
    /// the declared field count are ignored.
    pub fn compose_unchecked(&self, values: &[i32]) -> CompactId {
        self.pack_unchecked(values)
    }

    fn validate(&self, values: &[i32]) -> Result<(), RangeError> {
        for level in 0..values.len() {
            if !self.dictionary.matches(&values[..=level]) {
                let legal = self
                    .dictionary
                    .legal_values(level, &values[..level])
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "none".to_string());
                return Err(RangeError::OutOfRange {
                    field: self.field_name(level).to_string(),
                    value: values[level],
                    legal,
                });
            }
        }
        Ok(())
    }

    /// Value of field `level` in `id`, or `None` if the level is not
    /// declared or the code does not decode to a value.
    pub fn unpack(&self, id: CompactId, level: usize) -> Option<i32> {
        let layout = self.layouts.get(level)?;
        layout.encoding.decode(layout.codec.unpack(id))
    }

    /// The first `depth` field values of `id`.
    pub fn expand(&self, id: CompactId, depth: usize) -> Option<ExpandedId> {
        if depth > self.layouts.len() {
            return None;
        }
        (0..depth)
            .map(|level| self.unpack(id, level))
            .collect::<Option<SmallVec<_>>>()
    }

    /// `id` with every field at or below `depth` cleared, i.e. the id of
    /// its ancestor covering fields `0..depth`.
    pub fn truncate(&self, id: CompactId, depth: usize) -> CompactId {
        self.layouts
            .iter()
            .skip(depth)
            .fold(id, |id, layout| layout.codec.clear(id))
    }

    /// Dense index of `id` at the hash level. `O(log N)`.
    ///
    /// `None` is a normal answer: the id is not enumerated at this level.
    pub fn hash_of(&self, id: CompactId) -> Option<DenseIndex> {
        self.table
            .binary_search(&id)
            .ok()
            .map(|i| DenseIndex(i as u32))
    }

    /// Compact id at `index`. `O(1)`; `None` for out-of-range indices.
    pub fn id_of(&self, index: DenseIndex) -> Option<CompactId> {
        self.table.get(index.get()).copied()
    }

    /// Number of ids at the hash level.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the table is empty (never true for a built helper).
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Every id at the hash level, in dense-index order.
    pub fn ids(&self) -> &[CompactId] {
        &self.table
    }

    /// Neighbour of `index` in `dir`.
    pub fn neighbour(&self, index: DenseIndex, dir: Direction) -> Option<DenseIndex> {
        self.neighbours.get(index, dir)
    }

    /// Previous neighbour along eta.
    pub fn prev_eta(&self, index: DenseIndex) -> Option<DenseIndex> {
        self.neighbour(index, Direction::PrevEta)
    }

    /// Next neighbour along eta.
    pub fn next_eta(&self, index: DenseIndex) -> Option<DenseIndex> {
        self.neighbour(index, Direction::NextEta)
    }

    /// Previous neighbour along phi.
    pub fn prev_phi(&self, index: DenseIndex) -> Option<DenseIndex> {
        self.neighbour(index, Direction::PrevPhi)
    }

    /// Next neighbour along phi.
    pub fn next_phi(&self, index: DenseIndex) -> Option<DenseIndex> {
        self.neighbour(index, Direction::NextPhi)
    }

    /// The precomputed neighbour tables.
    pub fn neighbour_table(&self) -> &NeighbourTable {
        &self.neighbours
    }

    /// Level whose ids the dense index covers.
    pub fn hash_level(&self) -> usize {
        self.hash_level
    }

    /// Field index stepped by eta neighbours.
    pub fn eta_field(&self) -> Option<usize> {
        self.eta_field
    }

    /// Field index stepped by phi neighbours.
    pub fn phi_field(&self) -> Option<usize> {
        self.phi_field
    }

    /// Active range-check policy.
    pub fn range_check(&self) -> RangeCheck {
        self.range_check
    }

    /// Bit codec of field `level`.
    pub fn codec(&self, level: usize) -> Option<&FieldCodec> {
        self.layouts.get(level).map(|l| &l.codec)
    }

    /// The dictionary this helper was built from.
    pub fn dictionary(&self) -> &Arc<RangeDictionary> {
        &self.dictionary
    }

    fn field_name(&self, level: usize) -> &str {
        self.dictionary
            .field(level)
            .map(|f| f.name.as_str())
            .unwrap_or("?")
    }

    fn format_values(&self, values: &[i32]) -> String {
        let parts: Vec<String> = values
            .iter()
            .enumerate()
            .map(|(level, v)| format!("{}={v}", self.field_name(level)))
            .collect();
        parts.join("/")
    }

    /// Human-readable form of `id` down to the hash level, e.g.
    /// `part=1/row=0/module=3`. Undecodable ids print as raw hex.
    pub fn format_id(&self, id: CompactId) -> String {
        match self.expand(id, self.hash_level + 1) {
            Some(values) => self.format_values(&values),
            None => id.to_string(),
        }
    }
}

/// Largest table a `u32` dense index (minus the sentinel) can address.
const MAX_TABLE_LEN: usize = (u32::MAX - 1) as usize;
