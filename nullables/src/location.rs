//! Nullable location: scripted coarse positions.

use rollcall_geo::{Coordinates, LocationError, LocationProvider};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Clone)]
enum Behavior {
    Respond(Result<Coordinates, LocationError>),
    /// Never answer; the caller's timeout decides.
    Hang,
}

/// A location provider that answers with whatever it was told to.
pub struct NullLocation {
    behavior: Mutex<Behavior>,
    requests: AtomicUsize,
    in_flight: AtomicUsize,
}

/// Counts a request as in flight until its future finishes or is dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl NullLocation {
    fn with(behavior: Behavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            requests: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Report a fix at the given coordinates.
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self::with(Behavior::Respond(Ok(Coordinates::new(latitude, longitude))))
    }

    /// The user refused the location permission.
    pub fn denied() -> Self {
        Self::with(Behavior::Respond(Err(LocationError::PermissionDenied)))
    }

    pub fn unavailable() -> Self {
        Self::with(Behavior::Respond(Err(LocationError::Unavailable(
            "no fix".into(),
        ))))
    }

    pub fn hanging() -> Self {
        Self::with(Behavior::Hang)
    }

    /// Move the device.
    pub fn move_to(&self, latitude: f64, longitude: f64) {
        *self.behavior.lock().unwrap() =
            Behavior::Respond(Ok(Coordinates::new(latitude, longitude)));
    }

    /// How many positions were requested so far.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Requests started but neither answered nor cancelled.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

impl LocationProvider for NullLocation {
    async fn coarse_position(&self) -> Result<Coordinates, LocationError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let _guard = InFlight::enter(&self.in_flight);
        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            Behavior::Respond(result) => result,
            Behavior::Hang => std::future::pending().await,
        }
    }
}
