//! Edit transactions against a working copy of a printer profile.
//!
//! A [`ProfileEditSession`] owns its working copy outright. Nothing it does
//! is visible to the registry or the store until [`ProfileEditSession::commit`]
//! succeeds; dropping or discarding the session throws every staged change
//! away.

pub mod edit;

use std::path::Path;
use std::sync::Mutex;

use anyhow::anyhow;
use tracing::{debug, info, warn};

use crate::calibration::compute::{compute_calibration, CalibrationMeasurement};
use crate::calibration::measure::{FilamentMeasurement, FilamentMeasurer};
use crate::calibration::splice::SpliceDocument;
use crate::error::{FieldGroup, FieldViolation, SessionError, ValidationError};
use crate::profile::limits::ProfileLimits;
use crate::profile::registry::{ActiveSelection, ProfileRegistry};
use crate::profile::store::ProfileStore;
use crate::profile::types::{Calibration, ProfileId, PrinterProfile};
use crate::profile::validation::validate_profile;

pub use edit::{apply_edit, FieldEdit};

/// Proof that the holder started the session's single in-flight measurement.
#[derive(Debug, PartialEq, Eq)]
pub struct MeasurementTicket(u64);

#[derive(Debug, Default)]
enum MeasurementSlot {
    #[default]
    Idle,
    Pending(u64),
}

/// Holds the measurement slot while a measurement future is alive.
///
/// Dropping the future mid-measure frees the slot.
struct PendingMeasurement<'a> {
    slot: &'a mut MeasurementSlot,
    id: u64,
}

impl Drop for PendingMeasurement<'_> {
    fn drop(&mut self) {
        if matches!(*self.slot, MeasurementSlot::Pending(id) if id == self.id) {
            *self.slot = MeasurementSlot::Idle;
        }
    }
}

/// One edit transaction over a working copy of a printer profile.
#[derive(Debug)]
pub struct ProfileEditSession {
    working: PrinterProfile,
    source: Option<PrinterProfile>,
    limits: ProfileLimits,
    measurement: MeasurementSlot,
    measured: Option<FilamentMeasurement>,
    next_ticket: u64,
    committed: bool,
}

impl ProfileEditSession {
    /// Open a session on a clone of `source`, or on a fresh default profile.
    pub fn begin(source: Option<&PrinterProfile>, limits: ProfileLimits) -> Self {
        let working = match source {
            Some(profile) => {
                debug!("Editing profile {:?} ({})", profile.profile_name, profile.id);
                profile.clone()
            }
            None => {
                debug!("Creating a new profile");
                PrinterProfile::default()
            }
        };

        Self {
            working,
            source: source.cloned(),
            limits,
            measurement: MeasurementSlot::Idle,
            measured: None,
            next_ticket: 0,
            committed: false,
        }
    }

    /// New-profile flow with a default name that is free in `registry`.
    pub fn begin_new(registry: &ProfileRegistry, limits: ProfileLimits) -> Self {
        let mut session = Self::begin(None, limits);
        session.working.profile_name = registry.unique_name(&session.working.profile_name);
        session
    }

    pub fn working(&self) -> &PrinterProfile {
        &self.working
    }

    pub fn source_id(&self) -> Option<&ProfileId> {
        self.source.as_ref().map(|p| &p.id)
    }

    pub fn is_new(&self) -> bool {
        self.source.is_none()
    }

    /// True when the working copy differs from what the session started with.
    pub fn is_dirty(&self) -> bool {
        match &self.source {
            Some(source) => source != &self.working,
            None => true,
        }
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.committed {
            return Err(SessionError::Closed);
        }
        Ok(())
    }

    /// Apply one field edit to the working copy.
    pub fn apply(&mut self, edit: FieldEdit) -> Result<(), SessionError> {
        self.ensure_open()?;
        debug!("Applying edit {:?} to {:?}", edit, self.working.profile_name);
        apply_edit(&mut self.working, edit);
        Ok(())
    }

    /// Reserve the measurement slot. Fails while another measurement runs.
    pub fn begin_measurement(&mut self) -> Result<MeasurementTicket, SessionError> {
        self.ensure_open()?;
        if let MeasurementSlot::Pending(_) = self.measurement {
            return Err(SessionError::MeasurementInProgress);
        }
        self.next_ticket += 1;
        self.measurement = MeasurementSlot::Pending(self.next_ticket);
        Ok(MeasurementTicket(self.next_ticket))
    }

    fn release(&mut self, ticket: &MeasurementTicket) -> Result<(), SessionError> {
        match self.measurement {
            MeasurementSlot::Pending(id) if id == ticket.0 => {
                self.measurement = MeasurementSlot::Idle;
                Ok(())
            }
            _ => Err(SessionError::StaleTicket),
        }
    }

    /// Record the outcome of a measurement started with `ticket`.
    ///
    /// A failed measurement is reported and leaves any earlier successful
    /// measurement in place.
    pub fn finish_measurement(
        &mut self,
        ticket: MeasurementTicket,
        result: anyhow::Result<FilamentMeasurement>,
    ) -> Result<&FilamentMeasurement, SessionError> {
        self.release(&ticket)?;
        self.record_measurement(result)
    }

    fn record_measurement(
        &mut self,
        result: anyhow::Result<FilamentMeasurement>,
    ) -> Result<&FilamentMeasurement, SessionError> {
        let measurement = result.map_err(SessionError::Measurement)?;
        if !(measurement.total_extrusion_length.is_finite()
            && measurement.total_extrusion_length > 0.0)
        {
            return Err(SessionError::Measurement(anyhow!(
                "model at {:?} extrudes no filament",
                measurement.base_path
            )));
        }

        info!(
            "Measured calibration model: {:.1}mm of filament",
            measurement.total_extrusion_length
        );
        let stored: &FilamentMeasurement = self.measured.insert(measurement);
        Ok(stored)
    }

    /// Give up on a pending measurement without recording anything.
    pub fn cancel_measurement(&mut self, ticket: MeasurementTicket) -> Result<(), SessionError> {
        self.release(&ticket)?;
        debug!("Cancelled pending measurement");
        Ok(())
    }

    /// Measure the calibration model at `path` with `measurer`.
    ///
    /// Runs under the configured measurement timeout. If the returned future
    /// is dropped before it completes, the measurement slot is released.
    pub async fn measure_calibration_model<M: FilamentMeasurer>(
        &mut self,
        measurer: &M,
        path: &Path,
    ) -> Result<&FilamentMeasurement, SessionError> {
        let MeasurementTicket(id) = self.begin_measurement()?;
        let profile = self.working.clone();
        let timeout = self.limits.measurement_timeout();

        let result = {
            let _pending = PendingMeasurement {
                slot: &mut self.measurement,
                id,
            };
            match tokio::time::timeout(timeout, measurer.measure(path, &profile)).await {
                Ok(result) => result,
                Err(_) => Err(anyhow!("measuring {:?} timed out after {:?}", path, timeout)),
            }
        };
        if let Err(e) = &result {
            warn!("Filament measurement failed for {:?}: {}", path, e);
        }

        self.record_measurement(result)
    }

    pub fn measurement(&self) -> Option<&FilamentMeasurement> {
        self.measured.as_ref()
    }

    fn measured_length(&self) -> Result<&FilamentMeasurement, SessionError> {
        if let MeasurementSlot::Pending(_) = self.measurement {
            return Err(SessionError::MeasurementInProgress);
        }
        self.measured.as_ref().ok_or(SessionError::NotMeasured)
    }

    /// Compute calibration from the measured model and stage it on the
    /// working copy. On rejection the working copy is left unchanged.
    ///
    /// The same bounds apply whether the values were typed in by hand or
    /// collected by a guided flow.
    pub fn run_calibration(
        &mut self,
        loading_offset: u32,
        print_value: u32,
    ) -> Result<Calibration, SessionError> {
        self.ensure_open()?;
        let measured = self.measured_length()?;
        let measurement = CalibrationMeasurement {
            loading_offset,
            print_value,
            calibration_gcode_length: measured.total_extrusion_length,
        };

        let calibration = compute_calibration(&measurement, &self.limits.calibration)?;
        self.working.calibration = Some(calibration);
        info!(
            "Staged calibration for {:?}: {:.3} pulses/mm",
            self.working.profile_name,
            calibration.pulses_per_mm()
        );
        Ok(calibration)
    }

    /// Splice plan for the synthetic calibration print of the measured model.
    pub fn plan_calibration_print(&self) -> Result<SpliceDocument, SessionError> {
        let measured = self.measured_length()?;
        Ok(SpliceDocument::for_calibration(
            &self.working,
            measured,
            &self.limits,
        ))
    }

    /// Validate, persist and publish the working copy.
    ///
    /// The registry lock is held across the uniqueness check, the store
    /// write and the registry update, so concurrent commits never
    /// interleave. On a validation failure nothing is persisted and the
    /// session stays editable.
    pub fn commit(
        &mut self,
        registry: &Mutex<ProfileRegistry>,
        store: &impl ProfileStore,
    ) -> Result<ProfileId, SessionError> {
        self.ensure_open()?;

        let mut violations = validate_profile(&self.working, &self.limits);
        let mut registry = registry.lock().map_err(|_| SessionError::RegistryPoisoned)?;

        let name = &self.working.profile_name;
        if !name.trim().is_empty() && !registry.is_name_available(name, Some(&self.working.id)) {
            violations.push(FieldViolation::new(
                FieldGroup::Identity,
                "profile_name",
                format!("A profile named '{}' already exists", name),
            ));
        }

        if !violations.is_empty() {
            warn!(
                "Commit of {:?} rejected with {} violation(s)",
                self.working.profile_name,
                violations.len()
            );
            return Err(ValidationError { violations }.into());
        }

        store
            .save(&self.working)
            .map_err(SessionError::Persistence)?;
        registry.upsert(self.working.clone())?;

        self.committed = true;
        info!(
            "Committed profile {:?} ({})",
            self.working.profile_name, self.working.id
        );
        Ok(self.working.id.clone())
    }

    /// Drop the working copy. The source profile is untouched.
    pub fn discard(self) {
        if !self.committed && self.is_dirty() {
            info!("Discarded edits to {:?}", self.working.profile_name);
        }
    }
}

/// Delete a profile from storage and the registry.
///
/// The store is updated first so a failed delete leaves the registry intact.
pub fn delete_profile(
    registry: &Mutex<ProfileRegistry>,
    store: &impl ProfileStore,
    id: &ProfileId,
) -> Result<ActiveSelection, SessionError> {
    let mut registry = registry.lock().map_err(|_| SessionError::RegistryPoisoned)?;
    if registry.get(id).is_none() {
        return Err(crate::error::RegistryError::NotFound(id.clone()).into());
    }

    store.delete(id).map_err(SessionError::Persistence)?;
    let (removed, selection) = registry.remove(id)?;

    if selection == ActiveSelection::NeedsSetup {
        info!(
            "Deleted last profile {:?}; first-run setup required",
            removed.profile_name
        );
    }
    Ok(selection)
}
