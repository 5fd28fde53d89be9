//! End-to-end scene tests: echogram computation, RIR rendering, and the
//! streaming path through the public API.

use approx::assert_relative_eq;
use shoebox_sim::{
    Directivity, EchogramBound, OctaveBands, Position3D, Room, Scene, SimError, NUM_WALLS,
};

const SPEED_OF_SOUND: f32 = 343.0;
const SAMPLE_RATE: f32 = 48000.0;

fn shoebox_room(absorption: f32, bands: OctaveBands) -> Room {
    Room::new(
        [4.0, 4.0, 3.0],
        SPEED_OF_SOUND,
        SAMPLE_RATE,
        bands,
        vec![[absorption; NUM_WALLS]; bands.count],
    )
    .unwrap()
}

/// Scene with one omni receiver at (3, 1, 1.5) and one source at (1, 1, 1.5),
/// a 2 m direct path
fn direct_path_scene(room: Room) -> (Scene, shoebox_sim::ReceiverId, shoebox_sim::SourceId) {
    let mut scene = Scene::new(room).unwrap();
    let src = scene.add_source(Position3D::new(1.0, 1.0, 1.5)).unwrap();
    let rec = scene
        .add_receiver(
            Position3D::new(3.0, 1.0, 1.5),
            Directivity::SphericalHarmonic(0),
        )
        .unwrap();
    (scene, rec, src)
}

#[test]
fn test_direct_path_time_and_gain() {
    let (mut scene, rec, src) = direct_path_scene(shoebox_room(0.2, OctaveBands::default()));
    scene.compute_echograms(EchogramBound::MaxOrder(0)).unwrap();

    let echogram = scene.band_echogram(rec, src, 0).unwrap();
    assert_eq!(echogram.num_image_sources(), 1);

    // 2 m at 343 m/s: 5.83 ms, 1/d gain of 0.5
    let time = echogram.times()[0];
    assert_relative_eq!(time, 2.0 / SPEED_OF_SOUND, epsilon = 1e-6);
    assert_relative_eq!(time, 5.831e-3, epsilon = 1e-5);
    assert_relative_eq!(echogram.values(0)[0], 0.5, epsilon = 1e-6);
    assert_eq!(echogram.orders()[0], [0, 0, 0]);
}

#[test]
fn test_echogram_times_are_non_decreasing() {
    let (mut scene, rec, src) = direct_path_scene(shoebox_room(0.2, OctaveBands::default()));
    scene.compute_echograms(EchogramBound::MaxOrder(3)).unwrap();

    let echogram = scene.band_echogram(rec, src, 0).unwrap();
    assert!(echogram.num_image_sources() > 1);
    for pair in echogram.times().windows(2) {
        assert!(pair[0] <= pair[1]);
    }
}

#[test]
fn test_time_bound_limits_every_arrival() {
    let (mut scene, rec, src) = direct_path_scene(shoebox_room(0.2, OctaveBands::default()));
    let max_time = 0.05;
    scene
        .compute_echograms(EchogramBound::MaxTime(max_time))
        .unwrap();

    let echogram = scene.band_echogram(rec, src, 0).unwrap();
    assert!(echogram.num_image_sources() > 1);
    for &t in echogram.times() {
        assert!(t < max_time);
    }
}

#[test]
fn test_compute_is_idempotent() {
    let (mut scene, _, _) = direct_path_scene(shoebox_room(0.2, OctaveBands::default()));
    assert_eq!(scene.compute_echograms(EchogramBound::MaxOrder(2)).unwrap(), 1);
    assert_eq!(scene.compute_echograms(EchogramBound::MaxOrder(2)).unwrap(), 0);
    assert_eq!(scene.compute_echograms(EchogramBound::MaxOrder(2)).unwrap(), 0);
}

#[test]
fn test_add_remove_round_trip_reuses_slots() {
    let mut scene = Scene::new(shoebox_room(0.2, OctaveBands::default())).unwrap();
    let a = scene.add_source(Position3D::new(1.0, 1.0, 1.0)).unwrap();
    let b = scene.add_source(Position3D::new(2.0, 1.0, 1.0)).unwrap();
    assert_eq!(scene.num_sources(), 2);

    scene.remove_source(a).unwrap();
    scene.remove_source(b).unwrap();
    assert_eq!(scene.num_sources(), 0);

    // Slots are reused smallest-first, with fresh generations
    let c = scene.add_source(Position3D::new(1.0, 1.0, 1.0)).unwrap();
    assert_eq!(c.index(), a.index());
    assert_ne!(c, a);
    assert_eq!(scene.num_sources(), 1);
}

#[test]
fn test_remove_receiver_tears_down_pair_state() {
    let (mut scene, rec, src) = direct_path_scene(shoebox_room(0.2, OctaveBands::default()));
    scene.compute_echograms(EchogramBound::MaxOrder(1)).unwrap();
    scene.render_rirs(false).unwrap();
    assert!(scene.rir(rec, src).is_ok());

    scene.remove_receiver(rec).unwrap();
    assert_eq!(scene.num_receivers(), 0);

    // The stale handle is rejected, for lookups and a second removal
    assert!(matches!(
        scene.rir(rec, src),
        Err(SimError::UnknownReceiver { .. })
    ));
    assert!(matches!(
        scene.remove_receiver(rec),
        Err(SimError::UnknownReceiver { .. })
    ));

    // Re-adding reuses the slot under a fresh generation and starts
    // from a clean workspace
    let rec2 = scene
        .add_receiver(
            Position3D::new(3.0, 1.0, 1.5),
            Directivity::SphericalHarmonic(0),
        )
        .unwrap();
    assert_eq!(rec2.index(), rec.index());
    assert_ne!(rec2, rec);
    assert!(matches!(
        scene.rir(rec2, src),
        Err(SimError::RirNotRendered { .. })
    ));
    assert_eq!(scene.compute_echograms(EchogramBound::MaxOrder(1)).unwrap(), 1);
}

#[test]
fn test_zero_absorption_leaves_reflections_unattenuated() {
    let room = Room::anechoic_free_field([4.0, 4.0, 3.0], SAMPLE_RATE, OctaveBands::new(125.0, 2))
        .unwrap();
    let (mut scene, rec, src) = direct_path_scene(room);
    scene.compute_echograms(EchogramBound::MaxOrder(1)).unwrap();

    // Every image carries pure 1/d gain (clamped at 1), identically in
    // every band.
    for band in 0..2 {
        let echogram = scene.band_echogram(rec, src, band).unwrap();
        assert_eq!(echogram.num_image_sources(), 7);
        for image in 0..7 {
            let coords = echogram.coords()[image];
            let d = coords.magnitude();
            let expected = if d <= 1.0 { 1.0 } else { 1.0 / d };
            assert!((echogram.values(0)[image] - expected).abs() < 1e-5);
        }
    }
}

#[test]
fn test_rir_places_direct_impulse() {
    let room = Room::anechoic_free_field([4.0, 4.0, 3.0], SAMPLE_RATE, OctaveBands::new(125.0, 1))
        .unwrap();
    let (mut scene, rec, src) = direct_path_scene(room);
    scene.compute_echograms(EchogramBound::MaxOrder(0)).unwrap();
    scene.render_rirs(false).unwrap();

    let rir = scene.rir(rec, src).unwrap();
    let expected_index = (2.0 / SPEED_OF_SOUND * SAMPLE_RATE).ceil() as usize;
    assert_eq!(rir.length, expected_index + 1);
    assert!((rir.data[0][expected_index] - 0.5).abs() < 1e-6);
}

#[test]
fn test_multiband_rir_renders_nonzero_response() {
    let (mut scene, rec, src) = direct_path_scene(shoebox_room(0.3, OctaveBands::default()));
    scene.compute_echograms(EchogramBound::MaxOrder(2)).unwrap();
    scene.render_rirs(false).unwrap();

    let (length, energy) = {
        let rir = scene.rir(rec, src).unwrap();
        assert_eq!(rir.channels, 1);
        let energy: f32 = rir.data[0].iter().map(|v| v * v).sum();
        (rir.length, energy)
    };
    assert!(energy > 0.0);

    // Re-rendering without changes is a no-op and keeps the result
    scene.render_rirs(false).unwrap();
    assert_eq!(scene.rir(rec, src).unwrap().length, length);
}

#[test]
fn test_first_order_receiver_has_four_channels() {
    let room = shoebox_room(0.2, OctaveBands::default());
    let mut scene = Scene::new(room).unwrap();
    let src = scene.add_source(Position3D::new(1.0, 1.0, 1.5)).unwrap();
    let rec = scene
        .add_receiver(
            Position3D::new(3.0, 1.0, 1.5),
            Directivity::SphericalHarmonic(1),
        )
        .unwrap();
    scene.compute_echograms(EchogramBound::MaxOrder(1)).unwrap();
    scene.render_rirs(false).unwrap();

    assert_eq!(scene.band_echogram(rec, src, 0).unwrap().num_channels(), 4);
    assert_eq!(scene.rir(rec, src).unwrap().channels, 4);
}

#[test]
fn test_streaming_crossfade_between_generations() {
    let room = Room::anechoic_free_field([20.0, 20.0, 10.0], SAMPLE_RATE, OctaveBands::new(125.0, 1))
        .unwrap();
    let mut scene = Scene::new(room).unwrap();
    let src = scene.add_source(Position3D::new(1.0, 1.0, 1.5)).unwrap();
    let rec = scene
        .add_receiver(
            Position3D::new(3.0, 1.0, 1.5),
            Directivity::SphericalHarmonic(0),
        )
        .unwrap();
    scene.compute_echograms(EchogramBound::MaxOrder(0)).unwrap();

    let frame = 512;
    let input = vec![1.0f32; frame];
    let mut output = vec![vec![0.0f32; frame]];

    // Warm up past the longest delay so DC is steady at gain 0.5
    for _ in 0..4 {
        scene
            .apply_echograms_td(rec, &[(src, &input)], &mut output, frame, false)
            .unwrap();
    }
    assert!((output[0][frame - 1] - 0.5).abs() < 1e-5);

    // Move the source to 4 m (gain 0.25) and recompute mid-stream
    scene.update_source(src, Position3D::new(7.0, 1.0, 1.5)).unwrap();
    scene.compute_echograms(EchogramBound::MaxOrder(0)).unwrap();

    scene
        .apply_echograms_td(rec, &[(src, &input)], &mut output, frame, false)
        .unwrap();
    // Fade frame: starts near the old response, ends at the new one
    assert!((output[0][0] - 0.5).abs() < 0.01);
    assert!((output[0][frame - 1] - 0.25).abs() < 0.01);
    // Monotone transition between two DC levels
    for pair in output[0].windows(2) {
        assert!(pair[1] <= pair[0] + 1e-4);
    }

    // The next frame is the new response only
    scene
        .apply_echograms_td(rec, &[(src, &input)], &mut output, frame, false)
        .unwrap();
    for &v in &output[0] {
        assert!((v - 0.25).abs() < 1e-3);
    }
}

#[test]
fn test_streaming_rejects_stale_echograms() {
    let (mut scene, rec, src) = direct_path_scene(shoebox_room(0.2, OctaveBands::default()));
    let input = vec![0.0f32; 64];
    let mut output = vec![vec![0.0f32; 64]];

    assert!(matches!(
        scene.apply_echograms_td(rec, &[(src, &input)], &mut output, 64, false),
        Err(SimError::EchogramNotComputed { .. })
    ));

    scene.compute_echograms(EchogramBound::MaxOrder(1)).unwrap();
    scene
        .apply_echograms_td(rec, &[(src, &input)], &mut output, 64, false)
        .unwrap();
}

#[test]
fn test_streaming_validates_buffer_shapes() {
    let (mut scene, rec, src) = direct_path_scene(shoebox_room(0.2, OctaveBands::default()));
    scene.compute_echograms(EchogramBound::MaxOrder(0)).unwrap();

    let input = vec![0.0f32; 64];
    let mut wrong_channels = vec![vec![0.0f32; 64]; 2];
    assert!(matches!(
        scene.apply_echograms_td(rec, &[(src, &input)], &mut wrong_channels, 64, false),
        Err(SimError::OutputShapeMismatch { .. })
    ));

    let mut output = vec![vec![0.0f32; 64]];
    let short_input = vec![0.0f32; 32];
    assert!(matches!(
        scene.apply_echograms_td(rec, &[(src, &short_input)], &mut output, 64, false),
        Err(SimError::InputFrameTooShort { .. })
    ));
}

#[test]
fn test_two_sources_mix_into_one_receiver() {
    let room = Room::anechoic_free_field([20.0, 20.0, 10.0], SAMPLE_RATE, OctaveBands::new(125.0, 1))
        .unwrap();
    let mut scene = Scene::new(room).unwrap();
    let rec = scene
        .add_receiver(
            Position3D::new(3.0, 1.0, 1.5),
            Directivity::SphericalHarmonic(0),
        )
        .unwrap();
    // Both 2 m from the receiver, gain 0.5 each
    let s1 = scene.add_source(Position3D::new(1.0, 1.0, 1.5)).unwrap();
    let s2 = scene.add_source(Position3D::new(5.0, 1.0, 1.5)).unwrap();
    scene.compute_echograms(EchogramBound::MaxOrder(0)).unwrap();

    let frame = 1024;
    let input = vec![1.0f32; frame];
    let mut output = vec![vec![0.0f32; frame]];
    for _ in 0..2 {
        scene
            .apply_echograms_td(rec, &[(s1, &input), (s2, &input)], &mut output, frame, false)
            .unwrap();
    }
    assert!((output[0][frame - 1] - 1.0).abs() < 1e-5);
}
