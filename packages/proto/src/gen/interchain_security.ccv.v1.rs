/// CcvPacketData is the data carried by every packet of a CCV channel.
/// The provider only sends ValidatorSetChange packets, the consumer sends the others.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CcvPacketData {
    #[prost(oneof="ccv_packet_data::Packet", tags="1, 2, 3, 4")]
    pub packet: ::core::option::Option<ccv_packet_data::Packet>,
}
/// Nested message and enum types in `CcvPacketData`.
pub mod ccv_packet_data {
    #[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Packet {
        #[prost(message, tag="1")]
        ValidatorSetChange(super::ValidatorSetChangePacketData),
        #[prost(message, tag="2")]
        Slash(super::SlashPacketData),
        #[prost(message, tag="3")]
        VscMatured(super::VscMaturedPacketData),
        #[prost(message, tag="4")]
        ConsumerRegister(super::ConsumerRegisterPacketData),
    }
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ValidatorUpdate {
    #[prost(string, tag="1")]
    pub pub_key: ::prost::alloc::string::String,
    #[prost(uint64, tag="2")]
    pub power: u64,
}
/// ValidatorSetChangePacketData carries the power changes of one provider block
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ValidatorSetChangePacketData {
    #[prost(message, repeated, tag="1")]
    pub validator_updates: ::prost::alloc::vec::Vec<ValidatorUpdate>,
    #[prost(uint64, tag="2")]
    pub valset_update_id: u64,
    /// consumer keys whose downtime slash packets were handled since the previous packet
    #[prost(string, repeated, tag="3")]
    pub slash_acks: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct VscMaturedPacketData {
    #[prost(uint64, tag="1")]
    pub valset_update_id: u64,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SlashPacketData {
    #[prost(string, tag="1")]
    pub chain_id: ::prost::alloc::string::String,
    /// consumer consensus key of the offender
    #[prost(string, tag="2")]
    pub validator: ::prost::alloc::string::String,
    #[prost(uint64, tag="3")]
    pub power: u64,
    /// the id of the validator set update that was in force at the infraction height
    #[prost(uint64, tag="4")]
    pub valset_update_id: u64,
    #[prost(enumeration="Infraction", tag="5")]
    pub infraction: i32,
    #[prost(uint64, tag="6")]
    pub infraction_height: u64,
    #[prost(uint64, tag="7")]
    pub infraction_time_nanos: u64,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ConsumerRegisterPacketData {
    #[prost(string, tag="1")]
    pub chain_id: ::prost::alloc::string::String,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Infraction {
    Unspecified = 0,
    Downtime = 1,
    DoubleSign = 2,
}
