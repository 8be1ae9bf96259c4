//! Benchmark for full-container encode/decode through [`encode_script`] and
//! [`decode_script`].

use criterion::{Criterion, Throughput};
use message_script::codec::CodecOptions;
use message_script::model::{DialogueWindow, FormatVersion, Line, Script, SelectionWindow, Speaker, Token, Window};
use message_script::{decode_script, encode_script};

fn sample_script(window_count: usize) -> Script {
    let mut script = Script::new(FormatVersion::V1LittleEndian);
    for i in 0..window_count {
        if i % 2 == 0 {
            script.windows.push(Window::Dialogue(DialogueWindow {
                identifier: format!("dlg{i}"),
                speaker: Some(Speaker::Named(Line::from_tokens(vec![Token::text("Narrator")]))),
                lines: vec![
                    Line::from_tokens(vec![Token::text(format!("Line one of window {i}.")), Token::NewLine]),
                    Line::from_tokens(vec![Token::Function {
                        table_index: 0,
                        function_index: 2,
                        args: vec![100, -5],
                    }]),
                ],
            }));
        } else {
            script.windows.push(Window::Selection(SelectionWindow {
                identifier: format!("sel{i}"),
                lines: vec![
                    Line::from_tokens(vec![Token::text("Option A")]),
                    Line::from_tokens(vec![Token::text("Option B")]),
                ],
                field_18: 0,
                field_1c: 0,
                field_1e: 0,
            }));
        }
    }
    script
}

fn bench_encode(c: &mut Criterion) {
    let script = sample_script(200);
    let bytes = encode_script(&script, CodecOptions::default()).expect("valid script");

    let mut group = c.benchmark_group("encode_script");
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("200_windows", |b| {
        b.iter(|| encode_script(std::hint::black_box(&script), CodecOptions::default()).expect("valid script"));
    });
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let script = sample_script(200);
    let bytes = encode_script(&script, CodecOptions::default()).expect("valid script");

    let mut group = c.benchmark_group("decode_script");
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("200_windows", |b| {
        b.iter(|| decode_script(std::hint::black_box(&bytes)).expect("well-formed container"));
    });
    group.finish();
}

fn main() {
    let mut criterion = Criterion::default();
    bench_encode(&mut criterion);
    bench_decode(&mut criterion);
}
