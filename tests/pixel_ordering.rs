//! Two overlapping draws must resolve in submission order at the shared pixel.

use gsgl_shadergen::caps::DepthTestMethod;
use gsgl_shadergen::reference::{shade_fragment, DrawState, Pixel, ShadedFragment};
use gsgl_shadergen::{
    generate_sources, OrderingExtensions, OrderingMode, ShaderCaps, ShaderGenOptions,
};

fn opaque_draw() -> ShaderCaps {
    ShaderCaps {
        depth_test_method: DepthTestMethod::Always,
        depth_write_enabled: true,
        ..Default::default()
    }
}

#[test]
fn later_draw_wins_the_covered_pixel() {
    let caps = opaque_draw();
    let state = DrawState::default();
    let mut pixel = Pixel::default();

    let a = ShadedFragment::opaque([1.0, 0.0, 0.0], 0x1000);
    let b = ShadedFragment::opaque([0.0, 0.0, 1.0], 0x0800);
    for fragment in [a, b] {
        shade_fragment(&caps, &state, &fragment, &mut pixel);
    }

    assert_eq!(
        pixel,
        Pixel {
            color: [0, 0, 255, 255],
            depth: 0x0800,
        }
    );
}

#[test]
fn blended_overlap_depends_on_order() {
    // Ordering matters once the second fragment reads what the first wrote.
    let caps = ShaderCaps {
        has_alpha_blend: true,
        ..opaque_draw()
    };
    let state = DrawState::default();
    let half = |color: [f32; 3]| ShadedFragment {
        color: [color[0], color[1], color[2], 64.0 / 255.0],
        depth: 0.0,
        fog: 0.0,
    };
    let red = half([1.0, 0.0, 0.0]);
    let blue = half([0.0, 0.0, 1.0]);

    let mut ab = Pixel::default();
    shade_fragment(&caps, &state, &red, &mut ab);
    shade_fragment(&caps, &state, &blue, &mut ab);

    let mut ba = Pixel::default();
    shade_fragment(&caps, &state, &blue, &mut ba);
    shade_fragment(&caps, &state, &red, &mut ba);

    assert_ne!(ab.color, ba.color);
    assert!(ab.color[2] > ab.color[0]);
}

#[test]
fn selected_ordering_brackets_the_read_modify_write() {
    let available = OrderingExtensions::from_names([
        "GL_ARB_texture_storage",
        "GL_ARB_fragment_shader_interlock",
    ]);
    let ordering = OrderingMode::select(available);
    assert_eq!(ordering, OrderingMode::ArbInterlock);

    let fragment =
        generate_sources(&opaque_draw(), ordering, &ShaderGenOptions::default()).fragment;
    let begin = fragment.find_line("beginInvocationInterlockARB();").unwrap();
    let end = fragment.find_line("endInvocationInterlockARB();").unwrap();
    let first_access = fragment.find_line("imageStore(g_depthbuffer").unwrap();
    let last_access = fragment.find_line("imageStore(g_framebuffer").unwrap();
    assert!(begin < first_access);
    assert!(last_access < end);
}
