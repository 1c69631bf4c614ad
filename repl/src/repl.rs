use colored::Colorize;
use pairgc_core::gc::{GcConfig, Object};
use pairgc_core::interpreter::Interpreter;
use reedline::{DefaultPrompt, DefaultPromptSegment, Reedline, Signal};
use std::collections::HashMap;

type CommandFn = fn(&mut Repl, &[&str]) -> anyhow::Result<()>;

pub struct Repl {
    interpreter: Interpreter,
    pub commands: HashMap<String, CommandFn>,
    pub history: Vec<String>,
    line_number: usize,
}

impl Repl {
    pub fn new(config: GcConfig) -> Self {
        let mut commands = HashMap::new();
        commands.insert("help".to_string(), Self::cmd_help as CommandFn);
        commands.insert("exit".to_string(), Self::cmd_exit as CommandFn);
        commands.insert("quit".to_string(), Self::cmd_exit as CommandFn);
        commands.insert("history".to_string(), Self::show_history as CommandFn);
        commands.insert("stats".to_string(), Self::cmd_stats as CommandFn);
        commands.insert("stack".to_string(), Self::cmd_stack as CommandFn);
        commands.insert("heap".to_string(), Self::cmd_heap as CommandFn);
        commands.insert("gc".to_string(), Self::cmd_gc as CommandFn);
        commands.insert("reset".to_string(), Self::cmd_reset as CommandFn);

        Self {
            interpreter: Interpreter::with_config(config),
            commands,
            history: Vec::new(),
            line_number: 1,
        }
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        let _span = tracing::span!(tracing::Level::TRACE, "repl run").entered();
        let mut editor = Reedline::create();

        tracing::info!("{}", "pairgc REPL v0.1.0".bright_blue());
        tracing::info!(
            "{}",
            "Type ':help' for commands, ':exit' to quit.".bright_yellow()
        );

        loop {
            let prompt = self.make_prompt();
            let line = match editor.read_line(&prompt) {
                Ok(Signal::Success(input)) => input,
                Ok(Signal::CtrlD) | Ok(Signal::CtrlC) => break,
                Err(e) => {
                    println!("Input error: {e}");
                    continue;
                }
            };

            let trimmed = line.trim();

            if let Some(command) = trimmed.strip_prefix(':') {
                let mut parts = command.split_whitespace();
                if let Some(cmd) = parts.next() {
                    let args: Vec<&str> = parts.collect();
                    if let Some(handler) = self.commands.get(cmd).copied() {
                        if let Err(e) = handler(self, &args) {
                            println!("{}", format!("Error: {e}").red());
                        }
                        if cmd == "exit" || cmd == "quit" {
                            break;
                        }
                    } else {
                        println!("Unknown command: {cmd}");
                    }
                }
                continue;
            }

            if trimmed.is_empty() {
                continue;
            }
            self.history.push(line.clone());
            self.line_number += 1;
            self.evaluate_and_print(&line);
        }

        println!("Goodbye!");
        Ok(())
    }

    fn make_prompt(&self) -> DefaultPrompt {
        let vm = self.interpreter.vm();
        DefaultPrompt::new(
            DefaultPromptSegment::Basic(format!(
                "gc[{}|{}/{}]> ",
                self.line_number,
                vm.live_object_count(),
                vm.current_threshold()
            )),
            DefaultPromptSegment::Empty,
        )
    }

    fn evaluate_and_print(&mut self, code: &str) {
        match self.interpreter.interpret(code) {
            Ok(output) => {
                for line in output {
                    println!("=> {}", line.yellow());
                }
                let vm = self.interpreter.vm();
                println!(
                    "{}",
                    format!(
                        "   stack {} | live {} | threshold {}",
                        vm.stack_depth(),
                        vm.live_object_count(),
                        vm.current_threshold()
                    )
                    .dimmed()
                );
            }
            Err(e) => println!("{}", e.to_string().red()),
        }
    }

    fn cmd_help(&mut self, _args: &[&str]) -> anyhow::Result<()> {
        println!("Instructions:");
        println!("  push <int>   allocate a scalar and push it");
        println!("  pair         pop two entries, push a pair of them");
        println!("  pop          drop the top entry");
        println!("  dup          push the top entry again");
        println!("  setfirst     pop a value into the first field of the pair on top");
        println!("  setsecond    pop a value into the second field of the pair on top");
        println!("  gc           run a collection now");
        println!("  print        show the top entry");
        println!("Available commands:");
        let mut names: Vec<_> = self.commands.keys().collect();
        names.sort();
        for cmd in names {
            println!("  :{cmd}");
        }
        Ok(())
    }

    fn cmd_exit(&mut self, _args: &[&str]) -> anyhow::Result<()> {
        println!("Exiting REPL...");
        Ok(())
    }

    fn show_history(&mut self, _args: &[&str]) -> anyhow::Result<()> {
        for (i, entry) in self.history.iter().enumerate() {
            println!("{:>4}  {}", i + 1, entry);
        }
        Ok(())
    }

    fn cmd_stats(&mut self, _args: &[&str]) -> anyhow::Result<()> {
        let vm = self.interpreter.vm();
        println!("{}", vm.statistics());
        println!(
            "live objects: {}, stack depth: {}/{}, threshold: {}",
            vm.live_object_count(),
            vm.stack_depth(),
            vm.config().stack_max,
            vm.current_threshold()
        );
        Ok(())
    }

    fn cmd_stack(&mut self, _args: &[&str]) -> anyhow::Result<()> {
        let vm = self.interpreter.vm();
        if vm.stack_depth() == 0 {
            println!("(empty stack)");
            return Ok(());
        }
        let roots: Vec<_> = vm.roots().collect();
        for (depth, handle) in roots.iter().rev().enumerate() {
            let rendered = vm.render(*handle).unwrap_or_else(|| "<freed>".to_string());
            println!("{:>4}  {}  {}", depth, handle, rendered);
        }
        Ok(())
    }

    fn cmd_heap(&mut self, _args: &[&str]) -> anyhow::Result<()> {
        let heap = self.interpreter.vm().heap();
        println!(
            "{} live objects in {} slots ({} free)",
            heap.object_count(),
            heap.slot_count(),
            heap.free_slot_count()
        );
        for (handle, object) in heap.iter() {
            match object {
                Object::Scalar(value) => println!("  {handle}  scalar {value}"),
                Object::Pair { first, second } => {
                    println!("  {handle}  pair {first} {second}")
                }
            }
        }
        Ok(())
    }

    fn cmd_gc(&mut self, _args: &[&str]) -> anyhow::Result<()> {
        let result = self.interpreter.vm_mut().collect();
        println!(
            "collected {} of {} objects ({} marked), threshold {} -> {}, took {:?}",
            result.objects_collected,
            result.objects_before,
            result.objects_marked,
            result.threshold_before,
            result.threshold_after,
            result.duration
        );
        Ok(())
    }

    fn cmd_reset(&mut self, _args: &[&str]) -> anyhow::Result<()> {
        self.interpreter.reset();
        println!("VM reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_registered() {
        let repl = Repl::new(GcConfig::default());
        for name in ["help", "exit", "quit", "history", "stats", "stack", "heap", "gc", "reset"] {
            assert!(repl.commands.contains_key(name), "missing :{name}");
        }
    }

    #[test]
    fn test_gc_and_reset_commands() {
        let mut repl = Repl::new(GcConfig::default());
        repl.evaluate_and_print("push 1; push 2; pair; pop");
        assert_eq!(repl.interpreter.vm().live_object_count(), 3);

        Repl::cmd_gc(&mut repl, &[]).unwrap();
        assert_eq!(repl.interpreter.vm().live_object_count(), 0);

        repl.evaluate_and_print("push 5");
        Repl::cmd_stack(&mut repl, &[]).unwrap();
        Repl::cmd_heap(&mut repl, &[]).unwrap();
        Repl::cmd_reset(&mut repl, &[]).unwrap();
        assert_eq!(repl.interpreter.vm().stack_depth(), 0);
    }
}
