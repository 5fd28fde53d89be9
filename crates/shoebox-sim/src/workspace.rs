//! Per-pair computation workspace
//!
//! Every live (receiver, source) pair owns a `CoreWorkspace` holding the
//! intermediate echograms of the pipeline together with a small state
//! machine tracking which stages are out of date. Scene edits only mark
//! workspaces stale; all heavy recomputation happens on the explicit
//! compute and render calls.

use crate::directivity::{Directivity, apply_directivity};
use crate::echogram::Echogram;
use crate::error::{SimError, SimResult};
use crate::image_source::{EchogramBound, LatticeCache, compute_geometry};
use crate::absorption::apply_absorption;
use crate::position::Position3D;
use crate::rir::Rir;
use crate::room::Room;

/// Pipeline freshness for one source/receiver pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceState {
    /// Scene geometry changed, echograms no longer match it
    EchogramStale,
    /// Echograms are current but the rendered RIR is not
    RirStale,
    /// Everything is current
    Clean,
}

/// All cached state for one source/receiver pair
pub(crate) struct CoreWorkspace {
    pub(crate) state: WorkspaceState,
    /// Raised when a recompute lands while streaming is active; the next
    /// streamed frame cross-fades between the two echogram generations
    pub(crate) crossfade_pending: bool,
    /// Set once the pair has processed a streamed frame
    pub(crate) stream_active: bool,
    bound: Option<EchogramBound>,
    lattice: LatticeCache,
    geometric: Echogram,
    directional: Echogram,
    /// Current per-band echograms
    band: Vec<Echogram>,
    /// Previous-generation per-band echograms, kept for cross-fading
    band_prev: Vec<Echogram>,
    pub(crate) rir: Option<Rir>,
}

impl CoreWorkspace {
    pub(crate) fn new(num_bands: usize) -> Self {
        Self {
            state: WorkspaceState::EchogramStale,
            crossfade_pending: false,
            stream_active: false,
            bound: None,
            lattice: LatticeCache::default(),
            geometric: Echogram::new(),
            directional: Echogram::new(),
            band: vec![Echogram::new(); num_bands],
            band_prev: vec![Echogram::new(); num_bands],
            rir: None,
        }
    }

    pub(crate) fn state(&self) -> WorkspaceState {
        self.state
    }

    pub(crate) fn mark_echogram_stale(&mut self) {
        self.state = WorkspaceState::EchogramStale;
    }

    /// Called after the RIR has been rendered from current echograms
    pub(crate) fn set_clean(&mut self) {
        self.state = WorkspaceState::Clean;
    }

    /// Drop all cached results and resize for a new band layout
    pub(crate) fn reset_bands(&mut self, num_bands: usize) {
        self.band = vec![Echogram::new(); num_bands];
        self.band_prev = vec![Echogram::new(); num_bands];
        self.state = WorkspaceState::EchogramStale;
        self.crossfade_pending = false;
        self.bound = None;
        self.rir = None;
    }

    pub(crate) fn band_echograms(&self) -> &[Echogram] {
        &self.band
    }

    pub(crate) fn prev_band_echograms(&self) -> &[Echogram] {
        &self.band_prev
    }

    pub(crate) fn geometric_echogram(&self) -> &Echogram {
        &self.geometric
    }

    /// Run the echogram pipeline if this pair is stale or the bound changed.
    ///
    /// Returns `true` when a recompute actually happened. The previous band
    /// echograms are retained for one generation so an active stream can
    /// fade between the old and new responses.
    pub(crate) fn recompute(
        &mut self,
        room: &Room,
        source: Position3D,
        receiver: Position3D,
        directivity: Directivity,
        bound: EchogramBound,
    ) -> SimResult<bool> {
        let bound_changed = self.bound != Some(bound);
        if self.state != WorkspaceState::EchogramStale && !bound_changed {
            return Ok(false);
        }

        std::mem::swap(&mut self.band, &mut self.band_prev);

        compute_geometry(
            room,
            &source,
            &receiver,
            bound,
            &mut self.lattice,
            &mut self.geometric,
        )?;
        apply_directivity(&self.geometric, directivity, &mut self.directional)?;
        for (band_idx, echogram) in self.band.iter_mut().enumerate() {
            apply_absorption(&self.directional, room, band_idx, echogram)?;
        }

        self.bound = Some(bound);
        self.rir = None;
        if self.stream_active {
            self.crossfade_pending = true;
        }
        self.state = WorkspaceState::RirStale;
        Ok(true)
    }

    /// Verify all band echograms agree in shape before render or streaming
    pub(crate) fn check_band_consistency(&self) -> SimResult<()> {
        let expected = self.band[0].num_image_sources();
        for echogram in &self.band {
            if echogram.num_image_sources() != expected {
                return Err(SimError::ImageCountMismatch {
                    expected,
                    got: echogram.num_image_sources(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_room() -> Room {
        Room::new(
            [4.0, 4.0, 3.0],
            343.0,
            48000.0,
            crate::room::OctaveBands::default(),
            vec![[0.1; 6]; 6],
        )
        .unwrap()
    }

    #[test]
    fn test_fresh_workspace_is_stale() {
        let ws = CoreWorkspace::new(6);
        assert_eq!(ws.state(), WorkspaceState::EchogramStale);
        assert!(!ws.crossfade_pending);
    }

    #[test]
    fn test_recompute_transitions_to_rir_stale() {
        let room = test_room();
        let mut ws = CoreWorkspace::new(6);
        let did = ws
            .recompute(
                &room,
                Position3D::new(1.0, 1.0, 1.5),
                Position3D::new(3.0, 1.0, 1.5),
                Directivity::SphericalHarmonic(0),
                EchogramBound::MaxOrder(1),
            )
            .unwrap();
        assert!(did);
        assert_eq!(ws.state(), WorkspaceState::RirStale);
        assert_eq!(ws.band_echograms()[0].num_image_sources(), 7);
    }

    #[test]
    fn test_recompute_is_idempotent_until_marked_stale() {
        let room = test_room();
        let mut ws = CoreWorkspace::new(6);
        let src = Position3D::new(1.0, 1.0, 1.5);
        let rec = Position3D::new(3.0, 1.0, 1.5);
        let dir = Directivity::SphericalHarmonic(0);
        let bound = EchogramBound::MaxOrder(1);

        assert!(ws.recompute(&room, src, rec, dir, bound).unwrap());
        assert!(!ws.recompute(&room, src, rec, dir, bound).unwrap());

        ws.mark_echogram_stale();
        assert!(ws.recompute(&room, src, rec, dir, bound).unwrap());
    }

    #[test]
    fn test_bound_change_forces_recompute() {
        let room = test_room();
        let mut ws = CoreWorkspace::new(6);
        let src = Position3D::new(1.0, 1.0, 1.5);
        let rec = Position3D::new(3.0, 1.0, 1.5);
        let dir = Directivity::SphericalHarmonic(0);

        assert!(ws.recompute(&room, src, rec, dir, EchogramBound::MaxOrder(1)).unwrap());
        assert!(ws.recompute(&room, src, rec, dir, EchogramBound::MaxOrder(2)).unwrap());
        assert!(!ws.recompute(&room, src, rec, dir, EchogramBound::MaxOrder(2)).unwrap());
    }

    #[test]
    fn test_crossfade_raised_only_while_streaming() {
        let room = test_room();
        let mut ws = CoreWorkspace::new(6);
        let src = Position3D::new(1.0, 1.0, 1.5);
        let rec = Position3D::new(3.0, 1.0, 1.5);
        let dir = Directivity::SphericalHarmonic(0);
        let bound = EchogramBound::MaxOrder(1);

        ws.recompute(&room, src, rec, dir, bound).unwrap();
        assert!(!ws.crossfade_pending);

        ws.stream_active = true;
        ws.mark_echogram_stale();
        ws.recompute(&room, src, rec, dir, bound).unwrap();
        assert!(ws.crossfade_pending);
        // previous generation kept for the fade
        assert_eq!(ws.prev_band_echograms()[0].num_image_sources(), 7);
    }
}
