use crate::panel::Completion;

/// Define the types of events that can be sent from async tasks to the main loop
#[derive(Debug)]
pub enum AppEvent {
    /// A daemon call finished; the main loop applies it with `Panel::finish`.
    CallCompleted(Completion),
}
