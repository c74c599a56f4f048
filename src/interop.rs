//! Compute/graphics buffer sharing.
//!
//! The particle buffers are read by the rasterizer and written by the compute
//! kernel. A [`SharedBufferSet`] is always in exactly one of two states:
//!
//! | State | Who may touch the buffers |
//! |-------|---------------------------|
//! | [`Ownership::GraphicsOwned`] | draw calls, via [`SharedBufferSet::graphics`] |
//! | [`Ownership::ComputeOwned`] | kernel dispatches, via a [`ComputeLease`] |
//!
//! [`SharedBufferSet::acquire_for_compute`] hands out a lease that mutably
//! borrows the set, so a draw cannot even be written while the lease lives.
//! [`ComputeLease::release_to_graphics`] submits the enqueued work, transfers
//! ownership back and then blocks on a full queue-finish barrier: the
//! rasterizer does not track dependencies on compute work by itself.
//!
//! A lease dropped without being released leaves the set compute-owned and the
//! next draw fails with [`InteropError::ComputeOwned`] instead of reading
//! half-written buffers.

use std::ops::Deref;

use crate::error::InteropError;

/// Which engine currently has exclusive access to the buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ownership {
    #[default]
    GraphicsOwned,
    ComputeOwned,
}

/// Backend side of the handshake.
///
/// Implemented by the wgpu buffer set (work = command buffers submitted to the
/// queue, finish = blocking device poll) and by the CPU reference buffers,
/// where the work already happened by the time it is submitted.
pub trait SharedBuffers {
    /// Unit of compute work enqueued while the buffers are compute-owned.
    type Work;

    /// Number of particles `N`; every per-particle buffer has this length.
    fn particle_count(&self) -> u32;

    /// Hand the enqueued work to the compute queue.
    fn submit(&mut self, work: Vec<Self::Work>) -> Result<(), InteropError>;

    /// Block until every submitted piece of work has completed.
    fn finish(&mut self) -> Result<(), InteropError>;
}

/// Counters for the acquire/release protocol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteropLedger {
    pub acquires: u64,
    pub releases: u64,
    pub barriers: u64,
    pub draws: u64,
    /// Draws attempted while the set was compute-owned, and acquires of an
    /// already acquired set.
    pub violations: u64,
}

impl InteropLedger {
    /// Every acquire was released and no protocol violation happened.
    pub fn is_balanced(&self) -> bool {
        self.acquires == self.releases && self.violations == 0
    }
}

/// Particle buffers shared between the compute kernel and the renderer.
#[derive(Debug)]
pub struct SharedBufferSet<B: SharedBuffers> {
    buffers: B,
    owner: Ownership,
    ledger: InteropLedger,
}

impl<B: SharedBuffers> SharedBufferSet<B> {
    /// Wrap freshly created buffers; they start out graphics-owned.
    pub fn new(buffers: B) -> Self {
        Self {
            buffers,
            owner: Ownership::GraphicsOwned,
            ledger: InteropLedger::default(),
        }
    }

    pub fn owner(&self) -> Ownership {
        self.owner
    }

    pub fn ledger(&self) -> InteropLedger {
        self.ledger
    }

    pub fn particle_count(&self) -> u32 {
        self.buffers.particle_count()
    }

    /// Transfer every buffer to the compute engine.
    pub fn acquire_for_compute(&mut self) -> Result<ComputeLease<'_, B>, InteropError> {
        if self.owner == Ownership::ComputeOwned {
            self.ledger.violations += 1;
            return Err(InteropError::AlreadyAcquired);
        }
        self.owner = Ownership::ComputeOwned;
        self.ledger.acquires += 1;
        Ok(ComputeLease {
            set: self,
            pending: Vec::new(),
            released: false,
        })
    }

    /// Read access for a draw call. Fails while compute owns the buffers.
    pub fn graphics(&mut self) -> Result<GraphicsView<'_, B>, InteropError> {
        if self.owner == Ownership::ComputeOwned {
            self.ledger.violations += 1;
            return Err(InteropError::ComputeOwned);
        }
        self.ledger.draws += 1;
        Ok(GraphicsView {
            buffers: &self.buffers,
        })
    }

    /// Direct access for inspection outside the frame loop (tests, readback).
    pub fn inner(&self) -> &B {
        &self.buffers
    }
}

/// Exclusive compute access to a [`SharedBufferSet`] for one dispatch bracket.
#[must_use = "a lease must be released with `release_to_graphics` before drawing"]
pub struct ComputeLease<'a, B: SharedBuffers> {
    set: &'a mut SharedBufferSet<B>,
    pending: Vec<B::Work>,
    released: bool,
}

impl<'a, B: SharedBuffers> ComputeLease<'a, B> {
    /// Buffers for the kernel to bind or mutate.
    pub fn buffers(&mut self) -> &mut B {
        &mut self.set.buffers
    }

    /// Queue a piece of compute work; it is submitted on release.
    pub fn enqueue(&mut self, work: B::Work) {
        self.pending.push(work);
    }

    /// Submit the enqueued work, hand the buffers back to graphics and wait
    /// for the compute queue to drain.
    pub fn release_to_graphics(mut self) -> Result<(), InteropError> {
        let work = std::mem::take(&mut self.pending);
        self.released = true;

        let set = &mut *self.set;
        set.buffers.submit(work)?;
        set.owner = Ownership::GraphicsOwned;
        set.ledger.releases += 1;

        set.buffers.finish()?;
        set.ledger.barriers += 1;
        Ok(())
    }
}

impl<B: SharedBuffers> Drop for ComputeLease<'_, B> {
    fn drop(&mut self) {
        if !self.released {
            log::error!(
                "compute lease dropped without release; {} enqueued dispatches discarded, buffers stay compute-owned",
                self.pending.len()
            );
        }
    }
}

/// Shared access to the buffers for one draw call.
pub struct GraphicsView<'a, B> {
    buffers: &'a B,
}

impl<B> Deref for GraphicsView<'_, B> {
    type Target = B;

    fn deref(&self) -> &B {
        self.buffers
    }
}
