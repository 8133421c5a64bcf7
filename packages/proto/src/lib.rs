pub mod interchain_security {
    pub mod ccv {
        pub mod v1 {
            include!("gen/interchain_security.ccv.v1.rs");
        }
    }
}

#[cfg(test)]
mod test {
    use crate::interchain_security::ccv::v1::{
        ccv_packet_data::Packet, CcvPacketData, Infraction, SlashPacketData,
    };
    use prost::Message;

    #[test]
    fn empty_bytes_decode_to_empty_packet() {
        let data = CcvPacketData::decode(&[][..]).unwrap();
        assert!(data.packet.is_none());
    }

    #[test]
    fn unknown_infraction_decodes_to_default() {
        let slash = SlashPacketData {
            infraction: 42,
            ..Default::default()
        };
        let packet = CcvPacketData {
            packet: Some(Packet::Slash(slash)),
        };
        let decoded = CcvPacketData::decode(packet.encode_to_vec().as_slice()).unwrap();
        match decoded.packet {
            Some(Packet::Slash(slash)) => {
                assert_eq!(slash.infraction(), Infraction::Unspecified);
            }
            other => panic!("unexpected packet: {other:?}"),
        }
    }
}
