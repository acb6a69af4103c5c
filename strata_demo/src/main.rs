// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Example binary for `strata_compose`: composes a dual-axis chart twice and mounts it.

use std::sync::Arc;

use kurbo::{Point, Size};
use strata_compose::{
    Axis, AxisFields, AxisHandle, AxisSet, ColumnTable, DataProps, DataSource, Domain, Encoding,
    FieldDef, FieldGroup, FieldSubtype, FieldsConfig, GroupId, Layer, LayerAxes, LayerConfig,
    LayerContainer, LayerDefinition, LayerDomain, LayerEvent, LayerRegistry, LifecycleEvent,
    LifecycleNotifier, MarkTable, ModelHandle, ModelTransform, RenderUnit, Side,
    SkippedContribution, TraceSink, Tracer, TransformFn, Value, adjusted_domain,
    attach_axes_to_layers, attach_data_to_layers, layer_axis_index, nearest_dimensional_value,
    render_layers, transform_data_models, union_domain_from_layers,
};

/// A layer that only reports what it is asked to do.
struct Printed {
    kind: &'static str,
    config: LayerConfig,
    alias: String,
    data: Option<ModelHandle>,
    bound: usize,
}

impl Printed {
    fn new(kind: &'static str) -> Self {
        Self {
            kind,
            config: LayerConfig::default(),
            alias: String::new(),
            data: None,
            bound: 0,
        }
    }
}

impl Layer for Printed {
    type Deps = ();

    fn formal_name(&self) -> &'static str {
        self.kind
    }

    fn config(&self) -> &LayerConfig {
        &self.config
    }

    fn set_config(&mut self, config: LayerConfig) {
        self.config = config;
    }

    fn set_dependencies(&mut self, _: &()) {}

    fn alias(&self) -> &str {
        &self.alias
    }

    fn set_alias(&mut self, alias: String) {
        self.alias = alias;
    }

    fn set_encoding_transform(&mut self, _: Option<TransformFn>) {}

    fn set_data(&mut self, data: ModelHandle) {
        self.data = Some(data);
    }

    fn set_axes(&mut self, axes: LayerAxes) {
        self.bound = usize::from(axes.x.is_some()) + usize::from(axes.y.is_some());
    }

    fn data_domain(&self) -> Option<LayerDomain> {
        let data = self.data.as_ref()?;
        let domain = |side: Side| {
            let def = data.fields_config().get(self.config.encoding.field(side)?)?;
            Some(Domain::Discrete(data.column(def.index)))
        };
        Some(LayerDomain {
            x: domain(Side::X),
            y: domain(Side::Y),
        })
    }

    fn mount(&mut self, group: GroupId) {
        println!(
            "  mount {:<8} order {} into group {} ({} axes bound)",
            self.alias, self.config.order, group.0, self.bound
        );
    }

    fn remove(&mut self) {
        println!("  remove {}", self.alias);
    }
}

struct Stdout;

impl TraceSink for Stdout {
    fn on_layer_created(&mut self, e: &LayerEvent<'_>) {
        println!("  created {} as {:?}", e.alias, e.key);
    }

    fn on_layer_reused(&mut self, e: &LayerEvent<'_>) {
        println!("  reused  {} as {:?}", e.alias, e.key);
    }

    fn on_layer_released(&mut self, e: &LayerEvent<'_>) {
        println!("  released {} ({})", e.alias, e.identity);
    }

    fn on_init_order(&mut self, aliases: &[&str]) {
        println!("  init order: {}", aliases.join(" -> "));
    }

    fn on_contribution_skipped(&mut self, e: &SkippedContribution<'_>) {
        println!("  skipped {:?} domain of {:?}: {:?}", e.side, e.key, e.reason);
    }
}

#[derive(Default)]
struct Groups(u32);

impl LayerContainer for Groups {
    fn create_group(&mut self, parent: GroupId, class: Option<&str>) -> GroupId {
        self.0 += 1;
        println!("  group {} under {} {}", self.0, parent.0, class.unwrap_or(""));
        GroupId(self.0)
    }
}

struct Announce;

impl LifecycleNotifier for Announce {
    fn notify(&mut self, event: &LifecycleEvent<'_>) {
        println!(
            "  notify {:?} for {} {}s",
            event.action,
            event.client.len(),
            event.formal_name
        );
    }
}

/// Linear axis over `[d0, d1]` spanning `[0, len]` pixels.
struct Linear {
    d0: f64,
    d1: f64,
    len: f64,
}

impl Axis for Linear {
    fn invert(&self, position: f64) -> Option<Value> {
        Some(Value::Number(self.d0 + position / self.len * (self.d1 - self.d0)))
    }
}

fn linear(d0: f64, d1: f64, len: f64) -> AxisHandle {
    Arc::new(Linear { d0, d1, len })
}

fn model() -> ModelHandle {
    let fields = FieldsConfig::new()
        .with_field("Month", FieldDef::dimension(0).with_subtype(FieldSubtype::Temporal))
        .with_field("Revenue", FieldDef::measure(1))
        .with_field("Margin", FieldDef::measure(2));
    let months = [0.0, 31.0, 59.0, 90.0, 120.0, 151.0];
    let revenue = [12.0, 15.0, 9.0, 18.0, 21.0, 17.0];
    let margin = [-3.0, 1.5, -0.5, 2.0, 4.0, 2.5];
    let column =
        |values: &[f64]| -> Vec<Value> { values.iter().copied().map(Value::from).collect() };
    ColumnTable::new(fields, vec![column(&months), column(&revenue), column(&margin)])
        .into_handle()
}

fn definitions(with_trend: bool) -> Vec<LayerDefinition> {
    let mut defs = vec![
        LayerDefinition::new(
            "bar",
            LayerConfig::new(Encoding::default().with_x("Month").with_y("Revenue")),
        )
        .with_order(1),
        LayerDefinition::new(
            "line",
            LayerConfig::new(Encoding::default().with_x("Month").with_y("Margin"))
                .with_source(DataSource::Named("recent".into())),
        )
        .with_order(0),
    ];
    if with_trend {
        defs.push(
            LayerDefinition::new(
                "line",
                LayerConfig::new(Encoding::default().with_x("Month").with_y("Revenue"))
                    .with_name("trend")
                    .with_calculate_domain(false),
            )
            .with_order(2),
        );
    }
    defs
}

fn main() {
    let mut factory = MarkTable::new()
        .with_mark("bar", |_: &LayerConfig| Printed::new("bar"))
        .with_mark("line", |_: &LayerConfig| Printed::new("line"));
    let mut registry = LayerRegistry::new();
    let mut sink = Stdout;

    let model = model();
    let recent: ModelTransform = Arc::new(|m: &ModelHandle| {
        let columns = (0..3).map(|c| m.column(c)).collect();
        ColumnTable::new(m.fields_config().clone(), columns)
            .filter_rows(|row| row >= 2)
            .into_handle()
    });
    let transformed = transform_data_models([("recent", &recent)], &model);

    let axis_fields = AxisFields {
        x: vec![FieldGroup::single("Month")],
        y: vec![FieldGroup::single("Revenue"), FieldGroup::single("Margin")],
    };

    for (pass, with_trend) in [(1, true), (2, false)] {
        println!("pass #{pass}");
        let layers = match registry.create_layers(
            &mut factory,
            &(),
            &definitions(with_trend),
            &mut Tracer::new(&mut sink),
        ) {
            Ok(layers) => layers,
            Err(err) => {
                eprintln!("composition failed: {err}");
                return;
            }
        };

        attach_data_to_layers(&mut registry, &layers, &model, &transformed);
        let index = layer_axis_index(&registry, &layers, &axis_fields);
        let domains = union_domain_from_layers(
            &registry,
            &layers,
            &axis_fields,
            &index,
            model.fields_config(),
            &mut Tracer::new(&mut sink),
        );
        for (field, domain) in &domains {
            println!("  domain {field}: {domain:?}");
        }

        let (Some((r0, r1)), Some((m0, m1))) = (
            domains.get("Revenue").and_then(Domain::as_interval),
            domains.get("Margin").and_then(Domain::as_interval),
        ) else {
            continue;
        };
        let aligned = adjusted_domain([r1, m1], [r0, m0]);
        println!("  aligned: {aligned:?}");

        let Some((t0, t1)) = domains.get("Month").and_then(|d| {
            let values = d.values()?;
            Some((values.first()?.as_number()?, values.last()?.as_number()?))
        }) else {
            continue;
        };
        let axes = AxisSet {
            x: vec![linear(t0, t1, 600.0)],
            y: vec![
                linear(aligned.min[0], aligned.max[0], 400.0),
                linear(aligned.min[1], aligned.max[1], 400.0),
            ],
        };
        attach_axes_to_layers(&mut registry, &layers, &axes, &index);

        let props = DataProps::default().with_time_diff("Month", 28.0);
        let mut notifier = Announce;
        let mut unit = RenderUnit {
            class_prefix: "strata",
            data_props: &props,
            notifier: &mut notifier,
        };
        let mut groups = Groups::default();
        render_layers(
            &mut unit,
            &mut groups,
            GroupId(0),
            &mut registry,
            &layers,
            Size::new(600.0, 400.0),
        );

        let hover = Point::new(170.0, 200.0);
        if let Some(found) = nearest_dimensional_value(&axis_fields, &*model, &axes, hover) {
            println!("  nearest to {hover:?}: {:?} = {:?}", found.fields, found.keys);
        }
    }
}
