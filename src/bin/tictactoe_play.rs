use tictactoe::ttt::play_cmd::run_main;
use tictactoe::util;

fn main() -> tictactoe::Result<()> {
    util::init_globals();
    run_main()
}
