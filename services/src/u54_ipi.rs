// Licensed under the Apache-2.0 license

use hss_platform::HartId;
use hss_ssmb::{Ipi, MsgType};
use log::debug;

/// Intents the E51 sends to an application hart, in service order.
const U54_INTENTS: [MsgType; 3] = [MsgType::PmpSetup, MsgType::Goto, MsgType::OpenSbiInit];

/// Machine software interrupt entry on a U54. Services at most one intent
/// from the E51 and acknowledges the doorbell. Returns whether an intent was
/// found; if not, the interrupt was meant for a lower privilege level.
pub fn handle_ipi(ipi: &Ipi<'_>) -> bool {
    let me = ipi.hart();
    ipi.platform().memory_barrier();
    let found = U54_INTENTS
        .into_iter()
        .any(|intent| ipi.consume_intent(HartId::E51, intent));
    ipi.platform().clear_doorbell(me);
    debug!("{}: software interrupt, intent found: {}", me, found);
    found
}
