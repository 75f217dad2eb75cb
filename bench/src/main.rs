use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use raster_pipeline::{
    CompiledPipeline, MemoryCtx, Pipeline, PremulColor, STAGE_WIDTH, StageKind,
};
use serde_json::json;

/// Pixels per row; one short of a block multiple so the tail path is timed too.
const N: usize = 1023;

#[derive(Clone, Debug)]
struct BenchArgs {
    rows: u32,
    warmup: u32,
    repeats: u32,
    json: bool,
}

#[derive(Clone, Copy, Debug)]
enum Format {
    Srgb,
    F16,
}

impl Format {
    fn name(self) -> &'static str {
        match self {
            Self::Srgb => "srgb_srcover",
            Self::F16 => "f16_srcover",
        }
    }

    fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Srgb => 4,
            Self::F16 => 8,
        }
    }

    fn stages(self) -> (StageKind, StageKind) {
        match self {
            Self::Srgb => (StageKind::LoadDSrgb, StageKind::StoreSrgb),
            Self::F16 => (StageKind::LoadDF16, StageKind::StoreF16),
        }
    }
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn try_main() -> anyhow::Result<()> {
    let args = parse_args()?;
    if args.rows == 0 || args.repeats == 0 {
        anyhow::bail!("--rows and --repeats must be > 0");
    }
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    eprintln!(
        "{} rows of {N} pixels ({} full blocks + tail {}), {} repeat(s)",
        args.rows,
        N / STAGE_WIDTH,
        N % STAGE_WIDTH,
        args.repeats
    );

    let mut report = Vec::new();
    for format in [Format::Srgb, Format::F16] {
        let runs = bench_format(format, &args);
        let stats = percentiles(runs);
        let mpix = |d: Duration| {
            (f64::from(args.rows) * N as f64) / d.as_secs_f64().max(f64::EPSILON) / 1e6
        };
        eprintln!(
            "  {name:14} p50={p50:>10}  p90={p90:>10}  p99={p99:>10}  ({rate:.1} Mpix/s at p50)",
            name = format.name(),
            p50 = fmt_ms(stats[0]),
            p90 = fmt_ms(stats[1]),
            p99 = fmt_ms(stats[2]),
            rate = mpix(stats[0]),
        );
        report.push(json!({
            "pipeline": format.name(),
            "rows": args.rows,
            "width": N,
            "p50_ms": stats[0].as_secs_f64() * 1000.0,
            "p90_ms": stats[1].as_secs_f64() * 1000.0,
            "p99_ms": stats[2].as_secs_f64() * 1000.0,
        }));
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

/// `constant_color -> load_d -> srcover -> store` over one row buffer, rebinding the row.
fn build(format: Format, dst: &Rc<MemoryCtx>) -> CompiledPipeline {
    let (load, store) = format.stages();
    let color = Rc::new(Cell::new(PremulColor::from_array([0.4, 0.3, 0.2, 0.5])));
    let mut p = Pipeline::new();
    p.append(StageKind::ConstantColor, color);
    p.append(load, dst.clone());
    p.push(StageKind::SrcOver);
    p.append(store, dst.clone());
    p.compile()
}

fn bench_format(format: Format, args: &BenchArgs) -> Vec<Duration> {
    let row_bytes = N * format.bytes_per_pixel();
    let dst = Rc::new(MemoryCtx::zeroed(row_bytes * args.rows as usize));
    let pipeline = build(format, &dst);

    let pass = || {
        for y in 0..args.rows as usize {
            dst.set_origin((y * row_bytes) as isize);
            pipeline.run(0, y, N);
        }
    };

    for _ in 0..args.warmup {
        pass();
    }
    (0..args.repeats)
        .map(|_| {
            let t0 = Instant::now();
            pass();
            t0.elapsed()
        })
        .collect()
}

fn percentiles(mut v: Vec<Duration>) -> [Duration; 3] {
    v.sort_unstable();
    let p = |p: f64| {
        let n = v.len();
        let rank = (p * n as f64).ceil().clamp(1.0, n as f64) as usize;
        v[rank - 1]
    };
    [p(0.50), p(0.90), p(0.99)]
}

fn fmt_ms(d: Duration) -> String {
    format!("{:.3}ms", d.as_secs_f64() * 1000.0)
}

fn parse_args() -> anyhow::Result<BenchArgs> {
    let mut args = std::env::args().skip(1);
    let mut out = BenchArgs {
        rows: 256,
        warmup: 3,
        repeats: 50,
        json: false,
    };

    while let Some(a) = args.next() {
        match a.as_str() {
            "--rows" => out.rows = parse_u32(args.next(), "--rows")?,
            "--warmup" => out.warmup = parse_u32(args.next(), "--warmup")?,
            "--repeats" => out.repeats = parse_u32(args.next(), "--repeats")?,
            "--json" => out.json = true,
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => anyhow::bail!("unknown arg '{a}' (try --help)"),
        }
    }
    Ok(out)
}

fn parse_u32(v: Option<String>, flag: &str) -> anyhow::Result<u32> {
    let v = v.ok_or_else(|| anyhow::anyhow!("missing value for {flag}"))?;
    v.parse::<u32>()
        .map_err(|e| anyhow::anyhow!("invalid value for {flag}: '{v}' ({e})"))
}

fn print_help() {
    eprintln!(
        r#"raster-pipeline-bench

Times the sRGB and F16 srcover pipelines over rows of {N} pixels and reports p50/p90/p99.

Options:
  --rows <n>      rows per pass (default 256)
  --warmup <n>    untimed passes (default 3)
  --repeats <n>   timed passes (default 50)
  --json          print the report as JSON on stdout
"#
    );
}
