// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dimension-to-measure mapping for retinal encodings.
//!
//! When a dimension drives color, size or shape, legends and shared scales need to know which
//! measures that dimension splits. This collects them across layers.

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;

use crate::axis::Side;
use crate::config::LayerConfig;
use crate::field::FieldsConfig;
use crate::OrderedMap;

/// Maps each dimension field on a retinal channel to the measures on its layers' `x`/`y`.
///
/// Measures are deduplicated per dimension; dimensions and measures keep first-seen order.
/// Fields unknown to `fields` are ignored.
pub fn dimension_measure_map<'a>(
    configs: impl IntoIterator<Item = &'a LayerConfig>,
    fields: &FieldsConfig,
) -> OrderedMap<String, Vec<String>> {
    let mut out: OrderedMap<String, Vec<String>> = OrderedMap::default();
    for config in configs {
        let encoding = &config.encoding;
        let measures: Vec<&str> = Side::BOTH
            .into_iter()
            .filter_map(|side| encoding.field(side))
            .filter(|f| fields.get(f).is_some_and(|d| d.is_measure()))
            .collect();
        for dimension in encoding.retinal() {
            if !fields.get(dimension).is_some_and(|d| d.is_dimension()) {
                continue;
            }
            let entry = out.entry(String::from(dimension)).or_default();
            for &m in &measures {
                if !entry.iter().any(|e| e == m) {
                    entry.push(String::from(m));
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::config::Encoding;
    use crate::field::FieldDef;

    fn fields() -> FieldsConfig {
        FieldsConfig::new()
            .with_field("Region", FieldDef::dimension(0))
            .with_field("A", FieldDef::measure(1))
            .with_field("B", FieldDef::measure(2))
            .with_field("C", FieldDef::measure(3))
            .with_field("Year", FieldDef::dimension(4))
    }

    #[test]
    fn measures_are_merged_per_dimension() {
        let configs = [
            LayerConfig::new(Encoding::default().with_x("A").with_y("B").with_color("Region")),
            LayerConfig::new(Encoding::default().with_x("B").with_y("C").with_size("Region")),
        ];
        let map = dimension_measure_map(&configs, &fields());
        assert_eq!(map.len(), 1);
        assert_eq!(map["Region"], ["A", "B", "C"]);
    }

    #[test]
    fn measure_on_retinal_channel_and_unknown_fields_are_ignored() {
        let configs = [LayerConfig::new(
            Encoding::default()
                .with_x("Year")
                .with_y("Ghost")
                .with_color("A")
                .with_shape("Region"),
        )];
        let map = dimension_measure_map(&configs, &fields());
        assert_eq!(map.keys().collect::<Vec<_>>(), ["Region"]);
        assert!(map["Region"].is_empty());
    }
}
