//! Codec Tests
//!
//! Tests for command and response encoding/decoding.

use std::io::Cursor;

use tallykv::protocol::{
    decode_command, decode_response, encode_command, encode_response, is_identifier,
    read_command, read_response, write_command, write_response, ArithOp, Command, CommandType,
    Response, MAX_ENCODED_LEN,
};
use tallykv::{ErrorKind, TallyError};

fn protocol_error_message(result: tallykv::Result<Command>) -> String {
    match result {
        Err(TallyError::Protocol(message)) => message,
        other => panic!("Expected protocol error, got {:?}", other),
    }
}

// =============================================================================
// Command Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_encode_login() {
    let cmd = Command::Login {
        username: "alice".to_string(),
    };
    assert_eq!(encode_command(&cmd).unwrap(), "LOGIN alice\n");
}

#[test]
fn test_encode_set_and_no_arg_commands() {
    let set = Command::Set {
        table: "accounts".to_string(),
        key: "balance".to_string(),
    };
    assert_eq!(encode_command(&set).unwrap(), "SET accounts balance\n");
    assert_eq!(encode_command(&Command::Pop).unwrap(), "POP\n");
    assert_eq!(encode_command(&Command::Arith(ArithOp::Div)).unwrap(), "DIV\n");
    assert_eq!(encode_command(&Command::Commit).unwrap(), "COMMIT\n");
}

#[test]
fn test_decode_every_keyword() {
    let cases = vec![
        ("LOGIN alice\n", Command::Login { username: "alice".to_string() }),
        ("CREATE accounts\n", Command::Create { table: "accounts".to_string() }),
        ("PUSH 100\n", Command::Push { value: "100".to_string() }),
        ("POP\n", Command::Pop),
        ("TOP\n", Command::Top),
        (
            "SET accounts balance\n",
            Command::Set {
                table: "accounts".to_string(),
                key: "balance".to_string(),
            },
        ),
        (
            "GET accounts balance\n",
            Command::Get {
                table: "accounts".to_string(),
                key: "balance".to_string(),
            },
        ),
        ("ADD\n", Command::Arith(ArithOp::Add)),
        ("SUB\n", Command::Arith(ArithOp::Sub)),
        ("MUL\n", Command::Arith(ArithOp::Mul)),
        ("DIV\n", Command::Arith(ArithOp::Div)),
        ("BEGIN\n", Command::Begin),
        ("COMMIT\n", Command::Commit),
        ("BYE\n", Command::Bye),
    ];

    for (line, expected) in cases {
        let decoded = decode_command(line).unwrap();
        assert_eq!(decoded, expected, "decoding {:?}", line);
        // Re-encoding gives back the same line
        assert_eq!(encode_command(&decoded).unwrap(), line);
    }
}

#[test]
fn test_keyword_table_covers_arity() {
    assert_eq!(CommandType::ALL.len(), 14);
    for t in CommandType::ALL {
        assert_eq!(CommandType::from_keyword(t.as_str()), Some(t));
    }
    assert_eq!(CommandType::Set.arity(), 2);
    assert_eq!(CommandType::Push.arity(), 1);
    assert_eq!(CommandType::Bye.arity(), 0);
}

#[test]
fn test_decode_tolerates_extra_whitespace_and_crlf() {
    let cmd = decode_command("  GET\taccounts   balance \r\n").unwrap();
    assert_eq!(
        cmd,
        Command::Get {
            table: "accounts".to_string(),
            key: "balance".to_string(),
        }
    );
}

#[test]
fn test_push_accepts_any_token() {
    let cmd = decode_command("PUSH -42\n").unwrap();
    assert_eq!(cmd, Command::Push { value: "-42".to_string() });

    let cmd = decode_command("PUSH hello-world!\n").unwrap();
    assert_eq!(cmd, Command::Push { value: "hello-world!".to_string() });
}

// =============================================================================
// Command Validation Tests
// =============================================================================

#[test]
fn test_missing_newline_rejected() {
    let message = protocol_error_message(decode_command("LOGIN alice"));
    assert!(message.contains("newline"));
}

#[test]
fn test_unknown_command_rejected() {
    let message = protocol_error_message(decode_command("FROB x\n"));
    assert!(message.contains("Unknown command"));
}

#[test]
fn test_empty_line_rejected() {
    let message = protocol_error_message(decode_command("   \n"));
    assert!(message.contains("Empty"));
}

#[test]
fn test_response_keyword_rejected_as_request() {
    let message = protocol_error_message(decode_command("OK\n"));
    assert!(message.contains("not a valid request"));
}

#[test]
fn test_wrong_arity_rejected() {
    assert!(decode_command("LOGIN\n").is_err());
    assert!(decode_command("LOGIN alice bob\n").is_err());
    assert!(decode_command("SET accounts\n").is_err());
    assert!(decode_command("GET a b c\n").is_err());
    assert!(decode_command("POP now\n").is_err());
    assert!(decode_command("PUSH\n").is_err());
}

#[test]
fn test_non_identifier_names_rejected() {
    assert!(decode_command("LOGIN 9lives\n").is_err());
    assert!(decode_command("CREATE my-table\n").is_err());
    assert!(decode_command("SET accounts _balance\n").is_err());
    assert!(decode_command("GET acc.ounts balance\n").is_err());
}

#[test]
fn test_identifier_rules() {
    assert!(is_identifier("a"));
    assert!(is_identifier("accounts"));
    assert!(is_identifier("Table_2"));
    assert!(!is_identifier(""));
    assert!(!is_identifier("_x"));
    assert!(!is_identifier("1abc"));
    assert!(!is_identifier("ab-c"));
    assert!(!is_identifier("héllo"));
}

#[test]
fn test_encode_rejects_unrepresentable_commands() {
    let bad_name = Command::Create {
        table: "bad name".to_string(),
    };
    assert!(encode_command(&bad_name).is_err());

    let spaced_value = Command::Push {
        value: "two words".to_string(),
    };
    assert!(encode_command(&spaced_value).is_err());

    let empty_value = Command::Push {
        value: String::new(),
    };
    assert!(encode_command(&empty_value).is_err());
}

#[test]
fn test_max_length_enforced() {
    // Exactly at the limit: "PUSH " + value + "\n"
    let value = "x".repeat(MAX_ENCODED_LEN - 6);
    let line = format!("PUSH {}\n", value);
    assert_eq!(line.len(), MAX_ENCODED_LEN);
    assert!(decode_command(&line).is_ok());

    let too_long = format!("PUSH {}x\n", value);
    assert!(decode_command(&too_long).is_err());

    let cmd = Command::Push {
        value: format!("{}x", value),
    };
    assert!(encode_command(&cmd).is_err());
}

#[test]
fn test_protocol_errors_are_fatal() {
    let err = decode_command("NOPE\n").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert!(err.is_fatal());
}

// =============================================================================
// Response Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_encode_responses() {
    assert_eq!(encode_response(&Response::Ok).unwrap(), "OK\n");
    assert_eq!(
        encode_response(&Response::Data("100".to_string())).unwrap(),
        "DATA 100\n"
    );
    assert_eq!(
        encode_response(&Response::failed("Operand Stack was empty.")).unwrap(),
        "FAILED Operand Stack was empty.\n"
    );
    assert_eq!(
        encode_response(&Response::error("Protocol error: bad")).unwrap(),
        "ERROR Protocol error: bad\n"
    );
}

#[test]
fn test_failed_message_rejoined_with_single_spaces() {
    let decoded = decode_response("FAILED Key   not found:  missing_key\n").unwrap();
    assert_eq!(decoded, Response::Failed("Key not found: missing_key".to_string()));

    // Messages with odd whitespace are normalized on encode
    let encoded = encode_response(&Response::failed("two\nlines  here ")).unwrap();
    assert_eq!(encoded, "FAILED two lines here\n");
}

#[test]
fn test_decode_responses() {
    assert_eq!(decode_response("OK\n").unwrap(), Response::Ok);
    assert_eq!(
        decode_response("DATA 42\n").unwrap(),
        Response::Data("42".to_string())
    );
    assert_eq!(
        decode_response("ERROR Too many connections\n").unwrap(),
        Response::Error("Too many connections".to_string())
    );
}

#[test]
fn test_malformed_responses_rejected() {
    assert!(decode_response("OK extra\n").is_err());
    assert!(decode_response("DATA\n").is_err());
    assert!(decode_response("DATA a b\n").is_err());
    assert!(decode_response("FAILED\n").is_err());
    assert!(decode_response("LOGIN alice\n").is_err());
    assert!(decode_response("OK").is_err());
}

#[test]
fn test_encode_rejects_bad_payloads() {
    assert!(encode_response(&Response::Data("a b".to_string())).is_err());
    assert!(encode_response(&Response::failed("   ")).is_err());
}

#[test]
fn test_response_display_is_wire_form() {
    assert_eq!(Response::Ok.to_string(), "OK");
    assert_eq!(Response::Data("7".to_string()).to_string(), "DATA 7");
    assert_eq!(Response::failed("nope").to_string(), "FAILED nope");
}

// =============================================================================
// Stream I/O Tests
// =============================================================================

#[test]
fn test_stream_command_sequence() {
    let mut buffer = Vec::new();
    write_command(&mut buffer, &Command::Login { username: "bob".to_string() }).unwrap();
    write_command(&mut buffer, &Command::Push { value: "5".to_string() }).unwrap();
    write_command(&mut buffer, &Command::Bye).unwrap();

    let mut reader = Cursor::new(buffer);
    assert_eq!(
        read_command(&mut reader).unwrap(),
        Some(Command::Login { username: "bob".to_string() })
    );
    assert_eq!(
        read_command(&mut reader).unwrap(),
        Some(Command::Push { value: "5".to_string() })
    );
    assert_eq!(read_command(&mut reader).unwrap(), Some(Command::Bye));
    assert_eq!(read_command(&mut reader).unwrap(), None);
}

#[test]
fn test_stream_truncated_final_line() {
    let mut reader = Cursor::new(b"POP\nTOP".to_vec());
    assert_eq!(read_command(&mut reader).unwrap(), Some(Command::Pop));
    assert!(read_command(&mut reader).is_err());
}

#[test]
fn test_error_text_for_long_name_fits_on_the_wire() {
    let line = format!("CREATE 1{}\n", "a".repeat(999));
    assert!(line.len() <= MAX_ENCODED_LEN);

    let message = protocol_error_message(decode_command(&line));
    assert!(message.contains("Invalid table name"));
    assert!(message.ends_with("..."));

    let encoded = encode_response(&Response::error(message)).unwrap();
    assert!(encoded.len() <= MAX_ENCODED_LEN);
}

#[test]
fn test_error_text_replaces_control_characters() {
    let line = format!("{}\n", "\u{1}".repeat(300));
    let message = protocol_error_message(decode_command(&line));
    assert!(message.starts_with("Unknown command: ????"));
    assert!(!message.contains('\\'));
    assert!(message.chars().all(|c| c.is_ascii_graphic() || c == ' '));

    let encoded = encode_response(&Response::error(message)).unwrap();
    assert!(encoded.len() <= MAX_ENCODED_LEN);
}

#[test]
fn test_stream_overlong_line() {
    let mut data = vec![b'A'; MAX_ENCODED_LEN + 10];
    data.push(b'\n');
    let mut reader = Cursor::new(data);
    let err = read_command(&mut reader).unwrap_err();
    assert!(err.to_string().contains("maximum length"));
}

#[test]
fn test_stream_invalid_utf8() {
    let mut reader = Cursor::new(vec![0xFF, 0xFE, b'\n']);
    assert!(read_command(&mut reader).is_err());
}

#[test]
fn test_stream_response_sequence() {
    let mut buffer = Vec::new();
    write_response(&mut buffer, &Response::Ok).unwrap();
    write_response(&mut buffer, &Response::Data("100".to_string())).unwrap();

    let mut reader = Cursor::new(buffer);
    assert_eq!(read_response(&mut reader).unwrap(), Response::Ok);
    assert_eq!(
        read_response(&mut reader).unwrap(),
        Response::Data("100".to_string())
    );
    // End of stream while waiting for a response is an I/O error
    assert!(matches!(read_response(&mut reader), Err(TallyError::Io(_))));
}
