// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
use annotext_engine::{Annotation, AnnotationKind, Document, Span};

#[allow(dead_code)]
pub fn generate_passage(paragraphs: usize) -> String {
    let base = "In the early nineteenth century, cities grew faster than the water systems that served them. \
Engineers such as Joseph Bazalgette argued that sewers, not physicians, would end the cholera years. \
Critics called the plans extravagant; later historians called them the cheapest lives ever saved.\n\n";
    base.repeat(paragraphs)
}

/// One highlight on every `stride`-th word-sized run, with snippets captured.
#[allow(dead_code)]
pub fn generate_annotations(doc: &Document, stride: usize) -> Vec<Annotation> {
    let len = doc.len_utf16();
    let kinds = AnnotationKind::ALL;
    (0..)
        .map(|i| i * stride)
        .take_while(|start| start + 6 <= len)
        .enumerate()
        .filter_map(|(i, start)| {
            let span = Span::new(start, start + 6);
            let text = doc.slice(span)?;
            Some(
                Annotation::new(format!("a{i}").as_str(), span, kinds[i % kinds.len()])
                    .with_snippet(text),
            )
        })
        .collect()
}

/// Same annotations with every offset shifted, as after an upstream edit.
#[allow(dead_code)]
pub fn shift(annotations: &[Annotation], by: usize) -> Vec<Annotation> {
    annotations
        .iter()
        .cloned()
        .map(|mut a| {
            a.span = Span::new(a.span.start + by, a.span.end + by);
            a
        })
        .collect()
}
