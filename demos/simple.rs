use idea_core::analyze;
use miette::Report;

fn main() {
    let idea_data = r#"
        prop Text { type "text" }

        enum Roles { ADMIN "Admin" USER "User" }

        model User {
            id String @id
            name String @field.input(Text)
            role String @field.select(Roles) @default("USER")
        }
    "#;

    let result = match analyze(idea_data, "example.idea") {
        Ok(result) => result,
        Err(e) => {
            eprintln!("{:?}", Report::new(e));
            return;
        }
    };

    match result.to_json() {
        Ok(json_output) => println!("Compiled schema:\n{json_output}"),
        Err(e) => eprintln!("Failed to serialize: {e}"),
    }

    match result.finalize().map(|config| config.to_value()) {
        Ok(final_output) => println!("Final schema:\n{final_output:#}"),
        Err(e) => eprintln!("{:?}", Report::new(e)),
    }
}
