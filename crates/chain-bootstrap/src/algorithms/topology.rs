//! # Peer Topology
//!
//! Full-mesh persistent peer assembly over the peer table.

use crate::domain::{PeerTable, TopologyError};

/// Give every validator in `order` the addresses of all the others.
///
/// Peers keep declaration order. Fails without touching the table when a
/// validator has no recorded descriptor.
pub fn assemble_persistent_peers(
    order: &[String],
    table: &mut PeerTable,
) -> Result<(), TopologyError> {
    let addresses = order
        .iter()
        .map(|name| {
            table
                .get(name)
                .map(|peer| (name.as_str(), peer.peer_address.clone()))
                .ok_or_else(|| TopologyError::PeerNotFound {
                    validator: name.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    for name in order {
        let peers = addresses
            .iter()
            .filter(|(other, _)| *other != name.as_str())
            .map(|(_, address)| address.clone())
            .collect();
        if let Some(descriptor) = table.get_mut(name) {
            descriptor.persistent_peers = peers;
        }
    }
    Ok(())
}
