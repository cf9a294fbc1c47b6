use proptest::prelude::*;
use tartsmon::core::protocol::codec::{decode_temperature, parse_sensor_data, parse_scan_data};
use tartsmon::{decode_line, GatewayMessage, Membership, ScanResult};

/// Property tests for the line protocol decoder
#[cfg(test)]
mod protocol_tests {
    use super::*;

    proptest! {
        #[test]
        fn decode_never_panics(line in ".{0,80}") {
            let _ = decode_line(&line);
        }

        #[test]
        fn short_lines_are_ignored(line in "[ \t\r\n]{0,3}[a-zA-Z:]{0,2}[ \t\r\n]{0,3}") {
            prop_assert_eq!(decode_line(&line), None);
        }

        #[test]
        fn temperature_matches_formula(raw in any::<u16>()) {
            let [lsb, msb] = raw.to_le_bytes();
            let payload = format!("{:02x}{:02x}", lsb, msb);
            let decoded = decode_temperature(&payload).expect("valid payload");

            prop_assert!(decoded.ends_with('F'));
            let degrees: f64 = decoded.trim_end_matches('F').parse().expect("numeric");
            let expected = f64::from(raw) / 10.0 * 9.0 / 5.0 + 32.0;
            prop_assert!((degrees - expected).abs() < 1e-9);
        }

        #[test]
        fn bad_temperature_hex_is_unknown(payload in "[g-z]{4}") {
            let reading = parse_sensor_data(&format!("wd:1,2,-50,3.0,0,{}", payload));
            prop_assert_eq!(reading.value, "?");
            prop_assert_eq!(reading.id, "1");
        }

        #[test]
        fn non_temperature_value_is_verbatim(sensor_type in "[013-9]", value in "[0-9a-f]{1,12}") {
            let reading = parse_sensor_data(&format!("wd:7,{},-50,3.0,0,{}", sensor_type, value));
            prop_assert_eq!(reading.value, value);
        }

        #[test]
        fn short_data_lines_keep_placeholders(fields in proptest::collection::vec("[0-9]{1,4}", 0..6)) {
            let reading = parse_sensor_data(&format!("wd:{}", fields.join(",")));
            prop_assert_eq!(reading.id, "?");
            prop_assert_eq!(reading.value, "0");
        }

        #[test]
        fn scan_membership_only_known_on_one(id in "[0-9]{1,6}", flag in "[0-9a-z]{1,2}") {
            let scan = parse_scan_data(&format!("ws:{},2,{}", id, flag));
            prop_assert_eq!(&scan.id, &id);
            let expected = if flag == "1" { Membership::Known } else { Membership::Unknown };
            prop_assert_eq!(scan.known, expected);
        }

        #[test]
        fn decode_is_case_insensitive(id in "[0-9a-fA-F]{2,8}") {
            let upper = decode_line(&format!("ID:{}", id.to_uppercase()));
            let lower = decode_line(&format!("id:{}", id.to_lowercase()));
            prop_assert_eq!(upper, lower);
        }
    }

    #[test]
    fn test_reference_temperatures() {
        assert_eq!(decode_temperature("0000").as_deref(), Some("32.0F"));
        assert_eq!(decode_temperature("e100").as_deref(), Some("72.5F"));
        assert_eq!(decode_temperature("1001").as_deref(), Some("80.96F"));
        assert_eq!(decode_temperature("zz00"), None);
    }

    #[test]
    fn test_short_scan_line_is_placeholder() {
        assert_eq!(
            decode_line("ws:42"),
            Some(GatewayMessage::Scan(ScanResult::default()))
        );
    }
}
