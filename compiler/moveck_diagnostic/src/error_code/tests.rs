use super::*;

#[test]
fn test_error_code_display() {
    assert_eq!(ErrorCode::E4001.to_string(), "E4001");
    assert_eq!(ErrorCode::E9002.as_str(), "E9002");
}

#[test]
fn test_category_predicates_are_exclusive() {
    for code in ErrorCode::ALL {
        assert_ne!(code.is_move_error(), code.is_internal_error(), "{code}");
    }
    assert!(ErrorCode::E4007.is_move_error());
    assert!(ErrorCode::E9001.is_internal_error());
}

#[test]
fn test_from_str_round_trips_all() {
    for code in ErrorCode::ALL {
        assert_eq!(code.as_str().parse::<ErrorCode>(), Ok(*code));
    }
    assert_eq!("e4003".parse::<ErrorCode>(), Ok(ErrorCode::E4003));
    assert_eq!("E1234".parse::<ErrorCode>(), Err(()));
}

#[test]
fn test_all_is_sorted() {
    let mut sorted = ErrorCode::ALL.to_vec();
    sorted.sort();
    assert_eq!(sorted, ErrorCode::ALL);
}
