/// Implements assembling a signed key from a packet stream:
/// `primary (signature)* (user-id signature*)* (subkey signature*)*`.
///
/// Signatures directly on the primary key are skipped.
macro_rules! key_parser {
    ($key_type:ident, $primary_variant:ident, $subkey_variant:ident, $signed_subkey:ident, $subkeys:ident) => {
        impl $key_type {
            /// Assembles the key from parsed packets.
            pub fn from_packets<I>(packets: I) -> $crate::errors::Result<Self>
            where
                I: Iterator<Item = $crate::errors::Result<$crate::packet::Packet>>,
            {
                use $crate::packet::Packet;

                let mut packets = packets;
                let primary_key = match packets.next().transpose()? {
                    Some(Packet::$primary_variant(key)) => key,
                    Some(other) => bail!("expected a primary key, found {:?}", other.tag()),
                    None => bail!("no packets"),
                };

                let mut users: Vec<$crate::composed::SignedUser> = Vec::new();
                let mut $subkeys: Vec<($crate::packet::$subkey_variant, Vec<$crate::packet::Signature>)> =
                    Vec::new();

                for packet in packets {
                    match packet? {
                        Packet::Signature(sig) => {
                            if let Some(subkey) = $subkeys.last_mut() {
                                subkey.1.push(sig);
                            } else if let Some(user) = users.last_mut() {
                                user.signatures.push(sig);
                            } else {
                                log::debug!("skipping direct key signature {:?}", sig.typ());
                            }
                        }
                        Packet::UserId(id) => {
                            ensure!($subkeys.is_empty(), "user id after subkeys");
                            users.push($crate::composed::SignedUser::new(id, Vec::new()));
                        }
                        Packet::$subkey_variant(key) => {
                            $subkeys.push((key, Vec::new()));
                        }
                        other => bail!("unexpected packet {:?}", other.tag()),
                    }
                }

                let $subkeys = $subkeys
                    .into_iter()
                    .map(|(key, signatures)| $signed_subkey::new(key, signatures))
                    .collect();

                Ok(Self::new(primary_key, users, $subkeys))
            }

            /// Parses the key from binary packets.
            pub fn from_bytes(bytes: impl Into<bytes::Bytes>) -> $crate::errors::Result<Self> {
                Self::from_packets($crate::packet::PacketParser::new(bytes))
            }
        }
    };
}

pub(crate) use key_parser;
