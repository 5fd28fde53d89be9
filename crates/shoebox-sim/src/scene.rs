//! Scene management
//!
//! The `Scene` is the public entry point: it owns the room, the source and
//! receiver slots, one computation workspace per live (receiver, source)
//! pair, and the streaming engine. All edits are cheap and only mark the
//! affected workspaces stale; `compute_echograms` and `render_rirs` do the
//! actual work on demand.

use log::debug;
use serde::{Deserialize, Serialize};
use shoebox_dsp::Sample;
use shoebox_dsp::filterbank::{DEFAULT_FIR_LENGTH, OctaveFilterBank};

use crate::directivity::Directivity;
use crate::echogram::Echogram;
use crate::error::{SimError, SimResult};
use crate::image_source::EchogramBound;
use crate::position::Position3D;
use crate::rir::{Rir, render_rir};
use crate::room::{NUM_WALLS, OctaveBands, Room};
use crate::slots::SlotArena;
use crate::stream::{StreamEngine, check_frame_shape};
use crate::workspace::{CoreWorkspace, WorkspaceState};
use crate::{MAX_ROOM_RECEIVERS, MAX_ROOM_SOURCES};

/// Handle to a sound source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceId {
    index: usize,
    generation: u32,
}

impl SourceId {
    /// Slot index, stable for the lifetime of the source
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Handle to a receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReceiverId {
    index: usize,
    generation: u32,
}

impl ReceiverId {
    pub fn index(&self) -> usize {
        self.index
    }
}

struct SourceSlot {
    position: Position3D,
}

struct ReceiverSlot {
    position: Position3D,
    directivity: Directivity,
}

/// A shoebox room populated with sources and receivers
pub struct Scene {
    room: Room,
    sources: SlotArena<SourceSlot>,
    receivers: SlotArena<ReceiverSlot>,
    /// Workspace per live pair, `[receiver slot][source slot]`
    workspaces: Vec<Vec<Option<CoreWorkspace>>>,
    stream: StreamEngine,
    /// Shared octave filterbank, built lazily on first RIR render
    filterbank: Option<OctaveFilterBank>,
}

impl Scene {
    /// Create an empty scene in the given room
    pub fn new(room: Room) -> SimResult<Self> {
        room.validate()?;
        let num_bands = room.bands.count;
        Ok(Self {
            room,
            sources: SlotArena::with_capacity(MAX_ROOM_SOURCES),
            receivers: SlotArena::with_capacity(MAX_ROOM_RECEIVERS),
            workspaces: (0..MAX_ROOM_RECEIVERS)
                .map(|_| (0..MAX_ROOM_SOURCES).map(|_| None).collect())
                .collect(),
            stream: StreamEngine::new(num_bands),
            filterbank: None,
        })
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn num_sources(&self) -> usize {
        self.sources.len()
    }

    pub fn num_receivers(&self) -> usize {
        self.receivers.len()
    }

    /// Add a source at `position`. Fails when the capacity is exhausted.
    pub fn add_source(&mut self, position: Position3D) -> SimResult<SourceId> {
        let (index, generation) = self
            .sources
            .insert(SourceSlot { position })
            .ok_or(SimError::MaxSourcesExceeded {
                max: MAX_ROOM_SOURCES,
            })?;

        let num_bands = self.room.bands.count;
        for (receiver, _) in self.receivers.iter() {
            self.workspaces[receiver][index] = Some(CoreWorkspace::new(num_bands));
        }
        debug!("added source {index} (gen {generation}) at {position:?}");
        Ok(SourceId { index, generation })
    }

    /// Add a receiver with the given directivity pattern
    pub fn add_receiver(
        &mut self,
        position: Position3D,
        directivity: Directivity,
    ) -> SimResult<ReceiverId> {
        directivity.validate()?;
        let (index, generation) = self
            .receivers
            .insert(ReceiverSlot {
                position,
                directivity,
            })
            .ok_or(SimError::MaxReceiversExceeded {
                max: MAX_ROOM_RECEIVERS,
            })?;

        let num_bands = self.room.bands.count;
        for (source, _) in self.sources.iter() {
            self.workspaces[index][source] = Some(CoreWorkspace::new(num_bands));
        }
        debug!("added receiver {index} (gen {generation}) at {position:?}");
        Ok(ReceiverId { index, generation })
    }

    /// Move a source. An identical position is a no-op and keeps all
    /// cached results valid.
    pub fn update_source(&mut self, id: SourceId, position: Position3D) -> SimResult<()> {
        let slot = self
            .sources
            .get_mut(id.index, id.generation)
            .ok_or(SimError::UnknownSource {
                index: id.index,
                generation: id.generation,
            })?;
        if slot.position == position {
            return Ok(());
        }
        slot.position = position;
        for row in &mut self.workspaces {
            if let Some(ws) = &mut row[id.index] {
                ws.mark_echogram_stale();
            }
        }
        Ok(())
    }

    /// Move a receiver. An identical position is a no-op.
    pub fn update_receiver(&mut self, id: ReceiverId, position: Position3D) -> SimResult<()> {
        let slot = self
            .receivers
            .get_mut(id.index, id.generation)
            .ok_or(SimError::UnknownReceiver {
                index: id.index,
                generation: id.generation,
            })?;
        if slot.position == position {
            return Ok(());
        }
        slot.position = position;
        for ws in self.workspaces[id.index].iter_mut().flatten() {
            ws.mark_echogram_stale();
        }
        Ok(())
    }

    /// Remove a source and tear down its workspaces and stream state
    pub fn remove_source(&mut self, id: SourceId) -> SimResult<()> {
        self.sources
            .remove(id.index, id.generation)
            .ok_or(SimError::UnknownSource {
                index: id.index,
                generation: id.generation,
            })?;
        for row in &mut self.workspaces {
            row[id.index] = None;
        }
        self.stream.clear_source(id.index);
        debug!("removed source {}", id.index);
        Ok(())
    }

    /// Remove a receiver and tear down its workspaces and stream state
    pub fn remove_receiver(&mut self, id: ReceiverId) -> SimResult<()> {
        self.receivers
            .remove(id.index, id.generation)
            .ok_or(SimError::UnknownReceiver {
                index: id.index,
                generation: id.generation,
            })?;
        for ws in &mut self.workspaces[id.index] {
            *ws = None;
        }
        self.stream.clear_receiver(id.index);
        debug!("removed receiver {}", id.index);
        Ok(())
    }

    /// Resize the room. Unchanged dimensions are a no-op.
    pub fn set_room_dimensions(&mut self, dimensions: [f32; 3]) -> SimResult<()> {
        if self.room.dimensions == dimensions {
            return Ok(());
        }
        let mut candidate = self.room.clone();
        candidate.dimensions = dimensions;
        candidate.validate()?;
        self.room = candidate;
        self.mark_all_stale();
        Ok(())
    }

    /// Replace the per-band wall absorption table
    pub fn set_wall_absorption(&mut self, absorption: Vec<[f32; NUM_WALLS]>) -> SimResult<()> {
        if self.room.absorption == absorption {
            return Ok(());
        }
        let mut candidate = self.room.clone();
        candidate.absorption = absorption;
        candidate.validate()?;
        self.room = candidate;
        self.mark_all_stale();
        Ok(())
    }

    pub fn set_speed_of_sound(&mut self, speed_of_sound: f32) -> SimResult<()> {
        if self.room.speed_of_sound == speed_of_sound {
            return Ok(());
        }
        let mut candidate = self.room.clone();
        candidate.speed_of_sound = speed_of_sound;
        candidate.validate()?;
        self.room = candidate;
        self.mark_all_stale();
        Ok(())
    }

    /// Change the sample rate. Invalidates the filterbank, all streaming
    /// state, and every rendered RIR.
    pub fn set_sample_rate(&mut self, sample_rate: f32) -> SimResult<()> {
        if self.room.sample_rate == sample_rate {
            return Ok(());
        }
        let mut candidate = self.room.clone();
        candidate.sample_rate = sample_rate;
        candidate.validate()?;
        self.room = candidate;
        self.filterbank = None;
        self.stream.reset(self.room.bands.count);
        self.mark_all_stale();
        Ok(())
    }

    /// Change the octave band layout with a matching absorption table
    pub fn set_octave_bands(
        &mut self,
        bands: OctaveBands,
        absorption: Vec<[f32; NUM_WALLS]>,
    ) -> SimResult<()> {
        if self.room.bands == bands && self.room.absorption == absorption {
            return Ok(());
        }
        let mut candidate = self.room.clone();
        candidate.bands = bands;
        candidate.absorption = absorption;
        candidate.validate()?;
        self.room = candidate;
        self.filterbank = None;
        self.stream.reset(bands.count);
        for ws in self.workspaces.iter_mut().flatten().flatten() {
            ws.reset_bands(bands.count);
        }
        Ok(())
    }

    /// Recompute echograms for every stale pair under the given bound.
    ///
    /// Returns the number of pairs actually recomputed; calling again with
    /// an unchanged scene and bound recomputes nothing.
    pub fn compute_echograms(&mut self, bound: EchogramBound) -> SimResult<usize> {
        let mut recomputed = 0;
        for (receiver, rec_slot) in self.receivers.iter() {
            for (source, src_slot) in self.sources.iter() {
                let ws = self.workspaces[receiver][source]
                    .as_mut()
                    .ok_or(SimError::EchogramNotComputed {
                        receiver_index: receiver,
                        source_index: source,
                    })?;
                if ws.recompute(
                    &self.room,
                    src_slot.position,
                    rec_slot.position,
                    rec_slot.directivity,
                    bound,
                )? {
                    recomputed += 1;
                }
            }
        }
        debug!("computed echograms for {recomputed} pairs");
        Ok(recomputed)
    }

    /// Render a broadband RIR for every pair whose RIR is out of date.
    ///
    /// All echograms must be current. Fractional-delay rendering is
    /// rejected with a typed error.
    pub fn render_rirs(&mut self, fractional_delay: bool) -> SimResult<()> {
        if fractional_delay {
            return Err(SimError::FractionalRirUnsupported);
        }
        let filterbank = self.filterbank.get_or_insert_with(|| {
            OctaveFilterBank::design(
                &self.room.bands.cutoffs(),
                self.room.sample_rate,
                DEFAULT_FIR_LENGTH,
            )
        });

        for (receiver, _) in self.receivers.iter() {
            for (source, _) in self.sources.iter() {
                let ws = self.workspaces[receiver][source]
                    .as_mut()
                    .ok_or(SimError::EchogramNotComputed {
                        receiver_index: receiver,
                        source_index: source,
                    })?;
                match ws.state() {
                    WorkspaceState::EchogramStale => {
                        return Err(SimError::EchogramNotComputed {
                            receiver_index: receiver,
                            source_index: source,
                        });
                    }
                    WorkspaceState::Clean => {}
                    WorkspaceState::RirStale => {
                        ws.check_band_consistency()?;
                        ws.rir = Some(render_rir(
                            ws.band_echograms(),
                            self.room.sample_rate,
                            filterbank,
                            fractional_delay,
                        )?);
                        ws.set_clean();
                    }
                }
            }
        }
        Ok(())
    }

    /// Rendered RIR for one pair
    pub fn rir(&self, receiver: ReceiverId, source: SourceId) -> SimResult<&Rir> {
        let (rec_idx, src_idx) = self.pair_indices(receiver, source)?;
        self.workspaces[rec_idx][src_idx]
            .as_ref()
            .and_then(|ws| ws.rir.as_ref())
            .ok_or(SimError::RirNotRendered {
                receiver_index: rec_idx,
                source_index: src_idx,
            })
    }

    /// Current band echogram for one pair, mainly for inspection
    pub fn band_echogram(
        &self,
        receiver: ReceiverId,
        source: SourceId,
        band: usize,
    ) -> SimResult<&Echogram> {
        let (rec_idx, src_idx) = self.pair_indices(receiver, source)?;
        let ws = self.workspaces[rec_idx][src_idx].as_ref().ok_or(
            SimError::EchogramNotComputed {
                receiver_index: rec_idx,
                source_index: src_idx,
            },
        )?;
        if ws.state() == WorkspaceState::EchogramStale {
            return Err(SimError::EchogramNotComputed {
                receiver_index: rec_idx,
                source_index: src_idx,
            });
        }
        ws.band_echograms()
            .get(band)
            .ok_or(SimError::BandOutOfRange {
                count: self.room.bands.count,
                got: band,
            })
    }

    /// Stream one frame of every listed source to a receiver.
    ///
    /// `output` is overwritten with the mixed receiver frame, one buffer
    /// per directivity channel. Sources recomputed since the last frame
    /// cross-fade from their previous response within this frame.
    pub fn apply_echograms_td(
        &mut self,
        receiver: ReceiverId,
        inputs: &[(SourceId, &[Sample])],
        output: &mut [Vec<Sample>],
        frame_len: usize,
        fractional_delay: bool,
    ) -> SimResult<()> {
        let rec_slot = self.receivers.get(receiver.index, receiver.generation).ok_or(
            SimError::UnknownReceiver {
                index: receiver.index,
                generation: receiver.generation,
            },
        )?;
        check_frame_shape(output, rec_slot.directivity.num_channels(), frame_len)?;

        for channel in output.iter_mut() {
            channel[..frame_len].fill(0.0);
        }

        let cutoffs = self.room.bands.cutoffs();
        let sample_rate = self.room.sample_rate;
        for &(source, frame) in inputs {
            if frame.len() < frame_len {
                return Err(SimError::InputFrameTooShort {
                    need: frame_len,
                    got: frame.len(),
                });
            }
            self.sources
                .get(source.index, source.generation)
                .ok_or(SimError::UnknownSource {
                    index: source.index,
                    generation: source.generation,
                })?;
            let ws = self.workspaces[receiver.index][source.index]
                .as_mut()
                .ok_or(SimError::EchogramNotComputed {
                    receiver_index: receiver.index,
                    source_index: source.index,
                })?;
            if ws.state() == WorkspaceState::EchogramStale {
                return Err(SimError::EchogramNotComputed {
                    receiver_index: receiver.index,
                    source_index: source.index,
                });
            }
            self.stream.apply_pair(
                receiver.index,
                source.index,
                ws,
                frame,
                output,
                frame_len,
                fractional_delay,
                &cutoffs,
                sample_rate,
            )?;
        }
        Ok(())
    }

    fn mark_all_stale(&mut self) {
        for ws in self.workspaces.iter_mut().flatten().flatten() {
            ws.mark_echogram_stale();
        }
    }

    fn pair_indices(&self, receiver: ReceiverId, source: SourceId) -> SimResult<(usize, usize)> {
        self.receivers
            .get(receiver.index, receiver.generation)
            .ok_or(SimError::UnknownReceiver {
                index: receiver.index,
                generation: receiver.generation,
            })?;
        self.sources
            .get(source.index, source.generation)
            .ok_or(SimError::UnknownSource {
                index: source.index,
                generation: source.generation,
            })?;
        Ok((receiver.index, source.index))
    }
}
