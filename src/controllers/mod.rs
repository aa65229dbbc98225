mod event_detail;
mod event_list;
mod pairing;

pub use event_detail::{EventDetailController, EventDetailState};
pub use event_list::{EventListController, EventListState};
pub use pairing::{PairingController, PairingPhase, PairingState};
