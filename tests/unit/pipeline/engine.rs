use std::cell::Cell;
use std::rc::Rc;

use super::*;
use crate::foundation::core::PremulColor;
use crate::pipeline::builder::Pipeline;
use crate::pipeline::stage::MemoryCtx;

fn read_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

#[test]
fn partial_block_writes_exactly_n_pixels() {
    let color = Rc::new(Cell::new(PremulColor::from_array([1.0, 1.0, 1.0, 1.0])));
    let out = Rc::new(MemoryCtx::zeroed(8 * 4));
    let mut p = Pipeline::new();
    p.append(StageKind::ConstantColor, color);
    p.append(StageKind::Store8888, out.clone());
    p.compile().run(0, 0, 6);
    let bytes = out.bytes();
    assert!(bytes[..24].iter().all(|&b| b == 0xff));
    assert!(bytes[24..].iter().all(|&b| b == 0));
}

#[test]
fn run_with_zero_pixels_is_a_no_op() {
    let color = Rc::new(Cell::new(PremulColor::from_array([1.0; 4])));
    let out = Rc::new(MemoryCtx::zeroed(16));
    let mut p = Pipeline::new();
    p.append(StageKind::ConstantColor, color);
    p.append(StageKind::Store8888, out.clone());
    p.compile().run(0, 0, 0);
    assert!(out.bytes().iter().all(|&b| b == 0));
}

#[test]
fn blocks_see_pixel_center_coordinates() {
    let out = Rc::new(MemoryCtx::zeroed(5 * 16));
    let mut p = Pipeline::new();
    p.push(StageKind::SwapSrcDst);
    p.append(StageKind::StoreF32, out.clone());
    p.compile().run(0, 7, 5);
    let values = read_f32(&out.bytes());
    for px in 0..5 {
        assert_eq!(values[px * 4], px as f32 + 0.5);
        assert_eq!(values[px * 4 + 1], 7.5);
    }
}

#[test]
fn x_offset_addresses_memory() {
    let color = Rc::new(Cell::new(PremulColor::from_array([1.0; 4])));
    let out = Rc::new(MemoryCtx::zeroed(8));
    let mut p = Pipeline::new();
    p.append(StageKind::ConstantColor, color);
    p.append(StageKind::Store8888, out.clone());
    p.compile().run(1, 0, 1);
    assert_eq!(&out.bytes()[..], &[0, 0, 0, 0, 255, 255, 255, 255]);
}

fn halt(_: &mut Registers, _: &StageCtx) -> Flow {
    Flow::Stop
}

#[test]
fn stop_ends_the_chain_for_the_block() {
    let color = Rc::new(Cell::new(PremulColor::from_array([1.0; 4])));
    let out = Rc::new(MemoryCtx::zeroed(5 * 4));
    let step = |kind: StageKind, ctx: StageCtx| Step {
        kind,
        run: kernels::kernel(kind),
        ctx,
    };
    let compiled = CompiledPipeline {
        steps: vec![
            step(StageKind::ConstantColor, color.into()),
            Step {
                kind: StageKind::Trace,
                run: halt,
                ctx: StageCtx::None,
            },
            step(StageKind::Store8888, out.clone().into()),
        ]
        .into_boxed_slice(),
    };
    compiled.run(0, 0, 5);
    assert!(out.bytes().iter().all(|&b| b == 0));
}

#[test]
fn zero_coverage_still_reaches_the_store() {
    let color = Rc::new(Cell::new(PremulColor::from_array([1.0; 4])));
    let coverage = Rc::new(Cell::new(0.0f32));
    let out = Rc::new(MemoryCtx::new(vec![0xaa; 16]));
    let mut p = Pipeline::new();
    p.append(StageKind::ConstantColor, color);
    p.append(StageKind::ScaleConstantFloat, coverage.clone());
    p.append(StageKind::Store8888, out.clone());
    let compiled = p.compile();
    compiled.run(0, 0, 4);
    assert!(out.bytes().iter().all(|&b| b == 0));

    // Rebinding the coverage cell changes the next run without recompiling.
    coverage.set(1.0);
    compiled.run(0, 0, 4);
    assert!(out.bytes().iter().all(|&b| b == 0xff));
}

#[test]
fn rebinding_origin_moves_rows() {
    let color = Rc::new(Cell::new(PremulColor::from_array([1.0; 4])));
    let out = Rc::new(MemoryCtx::zeroed(2 * 2 * 4));
    let mut p = Pipeline::new();
    p.append(StageKind::ConstantColor, color);
    p.append(StageKind::Store8888, out.clone());
    let compiled = p.compile();
    out.set_origin(8);
    compiled.run(1, 1, 1);
    let bytes = out.bytes();
    assert!(bytes[..12].iter().all(|&b| b == 0));
    assert!(bytes[12..].iter().all(|&b| b == 0xff));
}

#[test]
fn compiled_debug_lists_kinds() {
    let mut p = Pipeline::new();
    p.push(StageKind::Clamp0);
    assert_eq!(format!("{:?}", p.compile()), "[Clamp0]");
    assert!(Pipeline::new().compile().is_empty());
}
