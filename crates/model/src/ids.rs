//! Marker types used to tag `utility::id::Id<T>`. Types referenced by other
//! crates (points, signals, railcars live in `reference-data`) get a marker
//! here so `model` does not have to depend on the crate that owns their
//! full definition.

pub struct Server;
pub struct DispatchPost;
pub struct Journey;
pub struct JourneyEvent;
pub struct VehicleSequence;
pub struct Point;
pub struct Signal;
pub struct Railcar;

impl utility::id::HasId for Server {}
impl utility::id::HasId for DispatchPost {}
impl utility::id::HasId for Journey {}
impl utility::id::HasId for JourneyEvent {}
impl utility::id::HasId for VehicleSequence {}
impl utility::id::HasId for Point {}
impl utility::id::HasId for Signal {}
impl utility::id::HasId for Railcar {}
