use super::*;

#[test]
fn object_stream_connects_to_every_stream_refinement() {
    for t in [PortType::Geometry, PortType::Timed, PortType::Animated] {
        assert!(PortType::ObjectStream.can_connect_to(t));
        assert!(t.can_connect_to(PortType::ObjectStream));
    }
}

#[test]
fn refinements_do_not_connect_sideways() {
    assert!(!PortType::Geometry.can_connect_to(PortType::Animated));
    assert!(!PortType::Timed.can_connect_to(PortType::Geometry));
}

#[test]
fn streams_and_scalars_do_not_mix() {
    assert!(!PortType::ObjectStream.can_connect_to(PortType::Number));
    assert!(!PortType::Boolean.can_connect_to(PortType::Geometry));
    assert!(!PortType::Number.can_connect_to(PortType::Boolean));
}

#[test]
fn any_is_universal() {
    assert!(PortType::Any.can_connect_to(PortType::Geometry));
    assert!(PortType::Number.can_connect_to(PortType::Any));
}

#[test]
fn scalar_widening_into_strings() {
    assert!(PortType::Number.can_connect_to(PortType::String));
    assert!(PortType::String.can_connect_to(PortType::Color));
    assert!(!PortType::String.can_connect_to(PortType::Number));
}

#[test]
fn port_types_serialize_snake_case() {
    assert_eq!(
        serde_json::to_string(&PortType::ObjectStream).unwrap(),
        "\"object_stream\""
    );
    assert_eq!(PortType::ObjectStream.to_string(), "object_stream");
}
