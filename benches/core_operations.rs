use appinfo_cache::appinfo::locate_document;
use appinfo_cache::{MetadataTree, extract_dlc_ids};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

/// steamcmd-style output with `depots` DLC depots and a matching listofdlc
fn synthetic_output(depots: u32) -> String {
    let mut out = String::from("Loading Steam API...OK\n\"10\"\n{\n\t\"common\"\n\t{\n\t\t\"type\"\t\t\"Game\"\n\t}\n");
    let list: Vec<String> = (0..depots).map(|i| (1000 + i).to_string()).collect();
    out.push_str(&format!(
        "\t\"extended\"\n\t{{\n\t\t\"listofdlc\"\t\t\"{}\"\n\t}}\n\t\"depots\"\n\t{{\n",
        list.join(",")
    ));
    for i in 0..depots {
        out.push_str(&format!(
            "\t\t\"{}\"\n\t\t{{\n\t\t\t\"maxsize\"\t\t\"1024\"\n\t\t\t\"dlcappid\"\t\t\"{}\"\n\t\t}}\n",
            20000 + i,
            1000 + i
        ));
    }
    out.push_str("\t\t\"branches\"\n\t\t{\n\t\t\t\"public\"\n\t\t\t{\n\t\t\t\t\"buildid\"\t\t\"42\"\n\t\t\t}\n\t\t}\n\t}\n}\nUnloading Steam API...OK");
    out
}

fn bench_locate_and_parse(c: &mut Criterion) {
    let output = synthetic_output(50);
    c.bench_function("locate_and_parse 50 depots", |b| {
        b.iter(|| {
            let document = locate_document(black_box(&output), 10).unwrap();
            MetadataTree::parse(&document).unwrap()
        })
    });
}

fn bench_dlc_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_dlc_ids");

    for depots in [10u32, 100, 1000] {
        let document = locate_document(&synthetic_output(depots), 10).unwrap();
        let tree = MetadataTree::parse(&document).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(depots), &tree, |b, tree| {
            b.iter(|| extract_dlc_ids(black_box(tree)))
        });
    }

    group.finish();
}

fn bench_build_id_lookup(c: &mut Criterion) {
    let document = locate_document(&synthetic_output(100), 10).unwrap();
    let tree = MetadataTree::parse(&document).unwrap();
    c.bench_function("branch_build_id", |b| {
        b.iter(|| black_box(&tree).branch_build_id(black_box("public")))
    });
}

criterion_group!(
    benches,
    bench_locate_and_parse,
    bench_dlc_extraction,
    bench_build_id_lookup
);
criterion_main!(benches);
