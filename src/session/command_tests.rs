use super::*;

#[test]
fn parses_run_with_nested_commas_in_goal() {
    let cmd = parse_command("run(member(X,[a,b,c]), -1).").unwrap();
    assert_eq!(
        cmd,
        Command::Run {
            goal_text: "member(X,[a,b,c])".to_string(),
            timeout: -1,
        }
    );
}

#[test]
fn parses_run_async() {
    let cmd = parse_command("run_async(member(X,[1,2]), -1, false).").unwrap();
    assert_eq!(
        cmd,
        Command::RunAsync {
            goal_text: "member(X,[1,2])".to_string(),
            timeout: -1,
            find_all: false,
        }
    );
}

#[test]
fn parses_async_result_with_and_without_timeout() {
    assert_eq!(
        parse_command("async_result(-1).").unwrap(),
        Command::AsyncResult { timeout: -1 }
    );
    assert_eq!(
        parse_command("async_result(0).").unwrap(),
        Command::AsyncResult { timeout: 0 }
    );
}

#[test]
fn parses_zero_arity_commands() {
    assert_eq!(parse_command("cancel_async.").unwrap(), Command::CancelAsync);
    assert_eq!(parse_command("close.").unwrap(), Command::Close);
    assert_eq!(parse_command("quit.").unwrap(), Command::Quit);
}

#[test]
fn unrecognized_functor_is_unknown_command() {
    assert_eq!(parse_command("frobnicate(1,2)."), Err("unknown_command"));
}

#[test]
fn malformed_parens_are_could_not_parse() {
    assert_eq!(parse_command("run(member(X,[a,b,c]"), Err("could_not_parse_command"));
}

#[test]
fn wrong_arity_is_could_not_parse() {
    assert_eq!(parse_command("run(member(X,[a,b,c]))."), Err("could_not_parse_command"));
}
