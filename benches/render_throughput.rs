//! End-to-end report throughput benchmarks
//!
//! Measures data processing, pagination and output with varying:
//! - Row counts (10, 100, 1000, 10000)
//! - Output formats (HTML, PDF)
//!
//! Run benchmarks: `cargo bench --bench render_throughput`

use banded::{OutputFormat, ReportPipeline, ReportPipelineBuilder, VecRowSource};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use serde_json::{Value, json};
use std::hint::black_box;

const GROUPED_REPORT: &str = r#"<jasperReport name="Bench">
  <field name="category" class="java.lang.String"/>
  <field name="item" class="java.lang.String"/>
  <field name="amount" class="java.math.BigDecimal"/>
  <variable name="CategoryTotal" class="java.math.BigDecimal" calculation="Sum" resetType="Group" resetGroup="Category">
    <variableExpression><![CDATA[$F{amount}]]></variableExpression>
  </variable>
  <variable name="PageTotal" class="java.math.BigDecimal" calculation="Sum" resetType="Page">
    <variableExpression><![CDATA[$F{amount}]]></variableExpression>
  </variable>
  <group name="Category">
    <groupExpression><![CDATA[$F{category}]]></groupExpression>
    <groupHeader><band height="20">
      <textField><reportElement x="0" y="0" width="300" height="20"/>
        <textFieldExpression><![CDATA["Category " + $F{category}]]></textFieldExpression></textField>
    </band></groupHeader>
    <groupFooter><band height="20">
      <textField pattern="currency"><reportElement x="300" y="0" width="255" height="20"/>
        <textFieldExpression><![CDATA[$V{CategoryTotal}]]></textFieldExpression></textField>
    </band></groupFooter>
  </group>
  <detail><band height="16">
    <textField><reportElement x="0" y="0" width="300" height="16"/>
      <textFieldExpression><![CDATA[upper($F{item})]]></textFieldExpression></textField>
    <textField pattern="number:2"><reportElement x="300" y="0" width="255" height="16"/>
      <textFieldExpression><![CDATA[$F{amount} * 1.2]]></textFieldExpression></textField>
  </band></detail>
  <pageFooter><band height="20">
    <textField><reportElement x="0" y="0" width="555" height="20"/>
      <textFieldExpression><![CDATA["Page " + $V{PAGE_NUMBER} + " of " + $V{PAGE_COUNT} + ", total " + $V{PageTotal}]]></textFieldExpression></textField>
  </band></pageFooter>
</jasperReport>"#;

fn rows(count: usize) -> Value {
    Value::Array(
        (0..count)
            .map(|i| {
                json!({
                    "category": format!("C{:03}", i / 25),
                    "item": format!("item {}", i),
                    "amount": (i % 97) as f64 + 0.25,
                })
            })
            .collect(),
    )
}

fn pipeline() -> ReportPipeline {
    ReportPipelineBuilder::new()
        .with_template_source(GROUPED_REPORT)
        .and_then(|b| b.build())
        .expect("benchmark template is valid")
}

fn bench_row_scaling(c: &mut Criterion) {
    let pipeline = pipeline();
    let mut group = c.benchmark_group("row_scaling");
    for count in [10usize, 100, 1000, 10000] {
        let data = rows(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("layout", count), &data, |b, data| {
            b.iter(|| {
                let source = VecRowSource::from_json_value(data.clone()).expect("rows");
                black_box(pipeline.layout(source).expect("layout"))
            })
        });
    }
    group.finish();
}

fn bench_formats(c: &mut Criterion) {
    let pipeline = pipeline();
    let data = rows(1000);
    let mut group = c.benchmark_group("output_format");
    group.throughput(Throughput::Elements(1000));
    for format in [OutputFormat::Html, OutputFormat::Pdf] {
        group.bench_with_input(BenchmarkId::from_parameter(format), &format, |b, &format| {
            b.iter(|| {
                let source = VecRowSource::from_json_value(data.clone()).expect("rows");
                black_box(pipeline.render_as(source, format).expect("render"))
            })
        });
    }
    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let pipeline = pipeline();
    let data = rows(200);
    c.bench_function("batch_16x200_pdf", |b| {
        b.iter(|| {
            let sources: Vec<VecRowSource> = (0..16)
                .map(|_| VecRowSource::from_json_value(data.clone()).expect("rows"))
                .collect();
            black_box(pipeline.generate_batch(sources))
        })
    });
}

criterion_group!(benches, bench_row_scaling, bench_formats, bench_batch);
criterion_main!(benches);
