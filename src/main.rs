use gosybox::Interpreter;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut sh = Interpreter::default();

    let code = match args.as_slice() {
        [] => sh.repl(),
        [flag] if flag == "-i" => sh.repl(),
        [name, rest @ ..] => {
            let rest: Vec<&str> = rest.iter().map(String::as_str).collect();
            sh.run(name, &rest)
        }
    };

    std::process::exit(code);
}
