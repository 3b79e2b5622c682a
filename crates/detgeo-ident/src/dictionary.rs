//! Multi-range dictionaries of legal identifier values.
//!
//! A [`RangeDictionary`] declares an ordered list of hierarchy fields and
//! a union of [`Region`]s. Each region is a Cartesian block: one
//! [`FieldRange`] per field, covering a prefix of the field list. The
//! same field may therefore have different legal spans under different
//! parent prefixes (e.g. a barrel with 4 layers next to an endcap with 9
//! disks), which a single flat interval per field cannot express.
//!
//! # Enumeration order
//!
//! [`enumerate`](RangeDictionary::enumerate) yields every legal expanded
//! id of a given depth in lexicographic order, deduplicated across
//! overlapping regions. Dense indices are assigned in this order, so it
//! must be stable across rebuilds of the same schema.

use std::collections::BTreeSet;

use detgeo_core::{EdgeBehavior, ExpandedId, SchemaError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::range::{merge_intervals, FieldRange};

/// Declaration of one hierarchy field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name, unique within the dictionary.
    pub name: String,
    /// Explicit bit width. `None` derives the width from the number of
    /// legal values across all regions.
    #[serde(default)]
    pub bits: Option<u32>,
    /// Neighbour behaviour at the edge of the legal range.
    #[serde(default)]
    pub edge: EdgeBehavior,
}

impl FieldDef {
    /// A field with derived width and absorbing edges.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bits: None,
            edge: EdgeBehavior::Absorb,
        }
    }

    /// Reserve exactly `bits` bits for this field.
    pub fn with_bits(mut self, bits: u32) -> Self {
        self.bits = Some(bits);
        self
    }

    /// Make neighbour derivation wrap around at the range edges.
    pub fn wrapping(mut self) -> Self {
        self.edge = EdgeBehavior::Wrap;
        self
    }
}

/// One Cartesian block of legal values, covering the first
/// `ranges.len()` fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// One range per covered field, outermost first.
    pub ranges: Vec<FieldRange>,
}

impl Region {
    /// Create a region from its per-field ranges.
    pub fn new(ranges: Vec<FieldRange>) -> Self {
        Self { ranges }
    }

    /// Number of fields this region covers.
    pub fn depth(&self) -> usize {
        self.ranges.len()
    }

    /// Whether every value of `values` is legal in this region.
    fn covers(&self, values: &[i32]) -> bool {
        values.len() <= self.ranges.len()
            && values
                .iter()
                .zip(&self.ranges)
                .all(|(v, range)| range.contains(*v))
    }

    /// Whether every value except the one at `skip` is legal here, and
    /// the region also declares field `skip`.
    fn covers_except(&self, values: &[i32], skip: usize) -> bool {
        skip < self.ranges.len()
            && values.len() <= self.ranges.len()
            && values
                .iter()
                .zip(&self.ranges)
                .enumerate()
                .all(|(i, (v, range))| i == skip || range.contains(*v))
    }
}

/// Serializable dictionary payload, as delivered by the database layer.
///
/// The crate owns no on-disk format; any serde format works.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionarySchema {
    /// Ordered field declarations, outermost first.
    pub fields: Vec<FieldDef>,
    /// Union of legal-value regions.
    pub regions: Vec<Region>,
}

impl DictionarySchema {
    /// An empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field declaration.
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Append a region.
    pub fn region(mut self, ranges: Vec<FieldRange>) -> Self {
        self.regions.push(Region::new(ranges));
        self
    }
}

/// Validated schema of legal per-context field values.
///
/// Immutable after construction and safe to share across threads.
#[derive(Clone, Debug)]
pub struct RangeDictionary {
    fields: Vec<FieldDef>,
    regions: Vec<Region>,
    by_name: IndexMap<String, usize>,
}

// Compile-time assertion: RangeDictionary must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<RangeDictionary>();
};

impl RangeDictionary {
    /// Validate a schema and build the dictionary.
    ///
    /// Enumerated value lists are sorted and deduplicated. Fails with a
    /// [`SchemaError`] if the schema declares no fields, repeats a field
    /// name, contains a region with zero or too many ranges, or contains
    /// an empty range.
    pub fn from_schema(schema: DictionarySchema) -> Result<Self, SchemaError> {
        let DictionarySchema {
            fields,
            mut regions,
        } = schema;

        if fields.is_empty() {
            return Err(SchemaError::NoFields);
        }

        let mut by_name = IndexMap::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            if by_name.insert(field.name.clone(), i).is_some() {
                return Err(SchemaError::DuplicateField {
                    name: field.name.clone(),
                });
            }
        }

        for (r, region) in regions.iter_mut().enumerate() {
            if region.ranges.is_empty() || region.ranges.len() > fields.len() {
                return Err(SchemaError::RegionArity {
                    region: r,
                    fields: fields.len(),
                    found: region.ranges.len(),
                });
            }
            for (f, range) in region.ranges.iter_mut().enumerate() {
                range.normalize();
                if range.is_empty() {
                    return Err(SchemaError::EmptyRange {
                        region: r,
                        field: fields[f].name.clone(),
                    });
                }
            }
        }

        tracing::debug!(
            fields = fields.len(),
            regions = regions.len(),
            "range dictionary loaded"
        );

        Ok(Self {
            fields,
            regions,
            by_name,
        })
    }

    /// Number of declared fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Field declaration at position `level`.
    pub fn field(&self, level: usize) -> Option<&FieldDef> {
        self.fields.get(level)
    }

    /// All field declarations, outermost first.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Declared regions.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Position of the field called `name`.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Resolve a field name, failing with [`SchemaError::UnknownField`].
    pub fn require_field(&self, name: &str) -> Result<usize, SchemaError> {
        self.field_index(name)
            .ok_or_else(|| SchemaError::UnknownField {
                name: name.to_string(),
            })
    }

    /// Whether `expanded` (a full id or a prefix) is legal.
    pub fn matches(&self, expanded: &[i32]) -> bool {
        !expanded.is_empty() && self.regions.iter().any(|r| r.covers(expanded))
    }

    /// Regions that declare `field` and accept `prefix` for the fields
    /// before it.
    fn regions_under<'a>(
        &'a self,
        field: usize,
        prefix: &'a [i32],
    ) -> impl Iterator<Item = &'a Region> + 'a {
        let prefix = &prefix[..prefix.len().min(field)];
        self.regions
            .iter()
            .filter(move |r| r.depth() > field && r.covers(prefix))
    }

    /// Smallest legal value of `field` under `prefix`.
    ///
    /// `prefix` holds the values of the fields before `field`; extra
    /// trailing values are ignored. Returns `None` if no region declares
    /// the field under that prefix.
    pub fn min_of(&self, field: usize, prefix: &[i32]) -> Option<i32> {
        self.regions_under(field, prefix)
            .filter_map(|r| r.ranges[field].min())
            .min()
    }

    /// Largest legal value of `field` under `prefix`.
    pub fn max_of(&self, field: usize, prefix: &[i32]) -> Option<i32> {
        self.regions_under(field, prefix)
            .filter_map(|r| r.ranges[field].max())
            .max()
    }

    /// Union of the legal values of `field` under `prefix`.
    pub fn legal_values(&self, field: usize, prefix: &[i32]) -> Option<FieldRange> {
        let ranges: Vec<&FieldRange> = self
            .regions_under(field, prefix)
            .map(|r| &r.ranges[field])
            .collect();
        union_of(&ranges)
    }

    /// Union of the legal values of `field` across every region.
    pub fn value_union(&self, field: usize) -> Option<FieldRange> {
        let ranges: Vec<&FieldRange> = self
            .regions
            .iter()
            .filter(|r| r.depth() > field)
            .map(|r| &r.ranges[field])
            .collect();
        union_of(&ranges)
    }

    /// Closed intervals covering every legal value of `field`.
    pub(crate) fn value_intervals(&self, field: usize) -> Vec<(i32, i32)> {
        let all = self
            .regions
            .iter()
            .filter(|r| r.depth() > field)
            .flat_map(|r| r.ranges[field].intervals())
            .collect();
        merge_intervals(all)
    }

    /// Next legal value of `field` with every other field of `expanded`
    /// held fixed.
    ///
    /// Honours the field's [`EdgeBehavior`]: under `Wrap` the successor of
    /// the last legal value is the first one, unless that is the current
    /// value itself.
    pub fn next_value(&self, expanded: &[i32], field: usize) -> Option<i32> {
        let current = *expanded.get(field)?;
        let next = self
            .candidates(expanded, field)
            .filter_map(|r| r.next_after(current))
            .min();
        if next.is_some() {
            return next;
        }
        match self.fields.get(field)?.edge {
            EdgeBehavior::Absorb => None,
            EdgeBehavior::Wrap => self
                .candidates(expanded, field)
                .filter_map(FieldRange::min)
                .min()
                .filter(|&v| v != current),
        }
    }

    /// Previous legal value of `field` with every other field of
    /// `expanded` held fixed.
    pub fn prev_value(&self, expanded: &[i32], field: usize) -> Option<i32> {
        let current = *expanded.get(field)?;
        let prev = self
            .candidates(expanded, field)
            .filter_map(|r| r.prev_before(current))
            .max();
        if prev.is_some() {
            return prev;
        }
        match self.fields.get(field)?.edge {
            EdgeBehavior::Absorb => None,
            EdgeBehavior::Wrap => self
                .candidates(expanded, field)
                .filter_map(FieldRange::max)
                .max()
                .filter(|&v| v != current),
        }
    }

    /// Ranges of `field` in every region that accepts all other values
    /// of `expanded`.
    fn candidates<'a>(
        &'a self,
        expanded: &'a [i32],
        field: usize,
    ) -> impl Iterator<Item = &'a FieldRange> + 'a {
        self.regions
            .iter()
            .filter(move |r| r.covers_except(expanded, field))
            .map(move |r| &r.ranges[field])
    }

    /// Every legal expanded id covering fields `0..=level`, in
    /// lexicographic order and without duplicates.
    ///
    /// The returned iterator owns its data; call again to restart.
    pub fn enumerate(&self, level: usize) -> impl Iterator<Item = ExpandedId> {
        let depth = level + 1;
        let mut out: BTreeSet<ExpandedId> = BTreeSet::new();
        if depth <= self.fields.len() {
            for region in self.regions.iter().filter(|r| r.depth() >= depth) {
                enumerate_region(&region.ranges[..depth], &mut out);
            }
        }
        out.into_iter()
    }
}

/// Odometer over the Cartesian product of `ranges` (rightmost fastest).
fn enumerate_region(ranges: &[FieldRange], out: &mut BTreeSet<ExpandedId>) {
    let values: Vec<Vec<i32>> = ranges.iter().map(FieldRange::values).collect();
    if values.iter().any(Vec::is_empty) {
        return;
    }
    let n = values.len();
    let mut indices = vec![0usize; n];
    loop {
        let id: ExpandedId = indices
            .iter()
            .enumerate()
            .map(|(i, &idx)| values[i][idx])
            .collect::<SmallVec<_>>();
        out.insert(id);

        let mut carry = true;
        for i in (0..n).rev() {
            if carry {
                indices[i] += 1;
                if indices[i] < values[i].len() {
                    carry = false;
                } else {
                    indices[i] = 0;
                }
            }
        }
        if carry {
            break;
        }
    }
}

/// Union of several ranges; a single range is returned unchanged.
fn union_of(ranges: &[&FieldRange]) -> Option<FieldRange> {
    match ranges {
        [] => None,
        [single] => Some((*single).clone()),
        many => {
            let intervals = merge_intervals(many.iter().flat_map(|r| r.intervals()).collect());
            match intervals.as_slice() {
                [(min, max)] => Some(FieldRange::bounded(*min, *max)),
                _ => Some(FieldRange::Intervals(intervals)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use smallvec::smallvec;

    fn e(values: &[i32]) -> ExpandedId {
        SmallVec::from_slice(values)
    }

    /// part 0: 2 rows x 3 modules; part 1: 3 rows x 5 modules (wrapping).
    fn two_part() -> RangeDictionary {
        RangeDictionary::from_schema(
            DictionarySchema::new()
                .field(FieldDef::new("part"))
                .field(FieldDef::new("row"))
                .field(FieldDef::new("module").wrapping())
                .region(vec![
                    FieldRange::single(0),
                    FieldRange::bounded(0, 1),
                    FieldRange::bounded(0, 2),
                ])
                .region(vec![
                    FieldRange::single(1),
                    FieldRange::bounded(0, 2),
                    FieldRange::bounded(0, 4),
                ]),
        )
        .unwrap()
    }

    // ── Validation ──────────────────────────────────────────────

    #[test]
    fn rejects_schema_without_fields() {
        assert_eq!(
            RangeDictionary::from_schema(DictionarySchema::new()).unwrap_err(),
            SchemaError::NoFields
        );
    }

    #[test]
    fn rejects_duplicate_field_names() {
        let schema = DictionarySchema::new()
            .field(FieldDef::new("row"))
            .field(FieldDef::new("row"));
        assert!(matches!(
            RangeDictionary::from_schema(schema),
            Err(SchemaError::DuplicateField { name }) if name == "row"
        ));
    }

    #[test]
    fn rejects_region_deeper_than_fields() {
        let schema = DictionarySchema::new()
            .field(FieldDef::new("row"))
            .region(vec![FieldRange::single(0), FieldRange::single(0)]);
        assert!(matches!(
            RangeDictionary::from_schema(schema),
            Err(SchemaError::RegionArity {
                region: 0,
                fields: 1,
                found: 2
            })
        ));
    }

    #[test]
    fn rejects_empty_range() {
        let schema = DictionarySchema::new()
            .field(FieldDef::new("row"))
            .region(vec![FieldRange::bounded(3, 1)]);
        assert!(matches!(
            RangeDictionary::from_schema(schema),
            Err(SchemaError::EmptyRange { region: 0, field }) if field == "row"
        ));
    }

    // ── Matching and bounds ─────────────────────────────────────

    #[test]
    fn matches_is_context_dependent() {
        let d = two_part();
        assert!(d.matches(&[0, 1, 2]));
        assert!(!d.matches(&[0, 2, 0])); // part 0 has only 2 rows
        assert!(d.matches(&[1, 2, 4]));
        assert!(!d.matches(&[1, 2, 5]));
        assert!(d.matches(&[1])); // prefixes match too
        assert!(!d.matches(&[]));
        assert!(!d.matches(&[0, 0, 0, 0]));
    }

    #[test]
    fn min_and_max_follow_prefix() {
        let d = two_part();
        assert_eq!(d.max_of(2, &[0, 0]), Some(2));
        assert_eq!(d.max_of(2, &[1, 0]), Some(4));
        assert_eq!(d.max_of(1, &[]), Some(2));
        assert_eq!(d.min_of(1, &[7]), None);
        assert_eq!(d.min_of(0, &[]), Some(0));
    }

    #[test]
    fn legal_values_union_across_regions() {
        let d = two_part();
        assert_eq!(d.legal_values(2, &[0, 1]), Some(FieldRange::bounded(0, 2)));
        assert_eq!(d.value_union(2), Some(FieldRange::bounded(0, 4)));
        assert_eq!(d.value_union(0), Some(FieldRange::bounded(0, 1)));
    }

    #[test]
    fn gapped_union_keeps_intervals() {
        let d = RangeDictionary::from_schema(
            DictionarySchema::new()
                .field(FieldDef::new("side"))
                .region(vec![FieldRange::single(-2)])
                .region(vec![FieldRange::single(2)]),
        )
        .unwrap();
        assert_eq!(d.value_union(0), Some(FieldRange::Intervals(vec![(-2, -2), (2, 2)])));
        assert_eq!(d.value_intervals(0), vec![(-2, -2), (2, 2)]);
    }

    #[test]
    fn wide_gapped_union_stays_compact() {
        let d = RangeDictionary::from_schema(
            DictionarySchema::new()
                .field(FieldDef::new("strip"))
                .region(vec![FieldRange::single(-5)])
                .region(vec![FieldRange::bounded(0, 1_000_000_000)]),
        )
        .unwrap();
        let union = d.value_union(0).unwrap();
        assert_eq!(union, FieldRange::Intervals(vec![(-5, -5), (0, 1_000_000_000)]));
        assert_eq!(union.len(), 1_000_000_002);
        assert_eq!(union.to_string(), "{-5,0:1000000000}");
        assert!(union.contains(7) && !union.contains(-1));
        assert_eq!(union.next_after(-5), Some(0));
        assert_eq!(union.prev_before(0), Some(-5));
    }

    // ── Neighbour values ────────────────────────────────────────

    #[test]
    fn next_and_prev_hold_other_fields_fixed() {
        let d = two_part();
        assert_eq!(d.next_value(&[0, 0, 1], 1), Some(1));
        assert_eq!(d.next_value(&[0, 1, 1], 1), None);
        assert_eq!(d.next_value(&[1, 1, 1], 1), Some(2));
        assert_eq!(d.prev_value(&[1, 0, 3], 1), None);
    }

    #[test]
    fn wrapping_field_closes_the_ring() {
        let d = two_part();
        assert_eq!(d.next_value(&[0, 0, 2], 2), Some(0));
        assert_eq!(d.prev_value(&[0, 0, 0], 2), Some(2));
        assert_eq!(d.next_value(&[1, 0, 4], 2), Some(0));
        assert_eq!(d.prev_value(&[1, 0, 0], 2), Some(4));
    }

    #[test]
    fn wrapping_single_value_has_no_neighbour() {
        let d = RangeDictionary::from_schema(
            DictionarySchema::new()
                .field(FieldDef::new("phi").wrapping())
                .region(vec![FieldRange::single(3)]),
        )
        .unwrap();
        assert_eq!(d.next_value(&[3], 0), None);
        assert_eq!(d.prev_value(&[3], 0), None);
    }

    #[test]
    fn neighbour_values_past_the_last_field_are_none() {
        for field in [FieldDef::new("phi"), FieldDef::new("phi").wrapping()] {
            let d = RangeDictionary::from_schema(
                DictionarySchema::new()
                    .field(field)
                    .region(vec![FieldRange::bounded(0, 3)]),
            )
            .unwrap();
            assert_eq!(d.next_value(&[0, 0], 1), None);
            assert_eq!(d.prev_value(&[0, 0], 1), None);
            assert_eq!(d.min_of(1, &[0]), None);
        }
    }

    // ── Enumeration ─────────────────────────────────────────────

    #[test]
    fn enumeration_is_lexicographic_and_complete() {
        let d = two_part();
        let all: Vec<ExpandedId> = d.enumerate(2).collect();
        assert_eq!(all.len(), 2 * 3 + 3 * 5);
        assert_eq!(all[0], e(&[0, 0, 0]));
        assert_eq!(all[1], e(&[0, 0, 1]));
        assert_eq!(all[3], e(&[0, 1, 0]));
        assert_eq!(all[6], e(&[1, 0, 0]));
        assert!(all.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn enumeration_at_shallower_level_deduplicates() {
        let d = two_part();
        let rows: Vec<ExpandedId> = d.enumerate(1).collect();
        let expected: Vec<ExpandedId> = vec![
            smallvec![0, 0],
            smallvec![0, 1],
            smallvec![1, 0],
            smallvec![1, 1],
            smallvec![1, 2],
        ];
        assert_eq!(rows, expected);
    }

    #[test]
    fn enumeration_is_restartable() {
        let d = two_part();
        let a: Vec<ExpandedId> = d.enumerate(2).collect();
        let b: Vec<ExpandedId> = d.enumerate(2).collect();
        assert_eq!(a, b);
        assert_eq!(d.enumerate(3).count(), 0);
    }

    #[test]
    fn overlapping_regions_enumerate_once() {
        let d = RangeDictionary::from_schema(
            DictionarySchema::new()
                .field(FieldDef::new("a"))
                .region(vec![FieldRange::bounded(0, 3)])
                .region(vec![FieldRange::bounded(2, 5)]),
        )
        .unwrap();
        let values: Vec<i32> = d.enumerate(0).map(|id| id[0]).collect();
        assert_eq!(values, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn schema_deserializes_from_json() {
        let json = r#"{
            "fields": [
                {"name": "row"},
                {"name": "module", "bits": 4, "edge": "wrap"}
            ],
            "regions": [
                {"ranges": [{"bounded": {"min": 0, "max": 1}}, {"enumerated": [3, 1, 2]}]}
            ]
        }"#;
        let schema: DictionarySchema = serde_json::from_str(json).unwrap();
        let d = RangeDictionary::from_schema(schema).unwrap();
        assert_eq!(d.field(1).unwrap().bits, Some(4));
        assert_eq!(d.field(1).unwrap().edge, EdgeBehavior::Wrap);
        assert_eq!(d.field_index("module"), Some(1));
        // Enumerated values were normalised.
        assert_eq!(d.regions()[0].ranges[1], FieldRange::values_of([1, 2, 3]));
    }

    proptest! {
        #[test]
        fn every_enumerated_id_matches(
            rows in 1i32..5,
            mods_a in 1i32..6,
            mods_b in 1i32..6,
        ) {
            let d = RangeDictionary::from_schema(
                DictionarySchema::new()
                    .field(FieldDef::new("part"))
                    .field(FieldDef::new("row"))
                    .field(FieldDef::new("module"))
                    .region(vec![
                        FieldRange::single(0),
                        FieldRange::bounded(0, rows - 1),
                        FieldRange::bounded(0, mods_a - 1),
                    ])
                    .region(vec![
                        FieldRange::single(1),
                        FieldRange::bounded(0, rows - 1),
                        FieldRange::bounded(0, mods_b - 1),
                    ]),
            )
            .unwrap();
            let all: Vec<ExpandedId> = d.enumerate(2).collect();
            prop_assert_eq!(all.len() as i32, rows * (mods_a + mods_b));
            for id in &all {
                prop_assert!(d.matches(id));
            }
        }
    }
}
