//! REPL command implementations. Negative results print in red and return
//! to the prompt; structural errors name the offending path and continue.

use std::io::{self, Write};

use apkshell::manifest::Component;
use apkshell::{Apk, patterns};
use colored::Colorize;

fn group_header(text: &str) {
    println!("{}", text.bright_black());
}

fn item(text: &str) {
    println!("\t{}", text.green());
}

fn negative(text: &str) {
    println!("{}", text.bright_red());
}

fn banner(sink_text: &str) {
    println!("{}", sink_text.bright_green());
}

fn command(name: &str, description: &str) {
    print!("{}", name.bright_green());
    println!(" - {}", description);
}

pub(crate) fn help() {
    println!("{}", "Commands:".yellow());

    println!();
    command("entry_points [ep]", "print list of entry points [LIMITED]");
    command("entry_points_extended [epe]", "print all possible entry points");

    println!();
    command("permissions [perms]", "permissions requested by the APK file");
    command("activities", "names of activities contained in the APK file");
    command("services", "names of services contained in the APK file");
    command(
        "receivers",
        "names of handlers declared in the APK file for receiving broadcasts",
    );

    println!();
    command("classes", "print all classes from APK file");
    command("class_info [class] class_path", "print list of methods from a class");
    command("find_class _str_", "find a class which contains _str_ string");

    println!();
    command("methods [funcs]", "print all methods from APK file");
    command("disassemble [dis] method_path", "disassemble a method");
    command("find_method [find_func] _str_", "find a method which contains _str_ string");

    println!();
    command("manifest", "print content of AndroidManifest.xml file");
    command(
        "is_debuggable",
        "checks android:debuggable field of AndroidManifest.xml file",
    );
    command("certificate", "print content of root certificate");
    command(
        "creation_date",
        "print creation date of the application based on a certificate",
    );
    command("revoke_date", "print certificate expiration date");

    println!();
    command("libs", "print list of native library files");
    command("dump_libs", "write all lib files to disk");
    command("dump_lib lib_path", "write 'lib_path' file to disk");
    command("libs_hash [libh]", "SHA-1 hashes of lib files");

    println!();
    command("strings [strs]", "print the strings of APK (thanks to Strings Constant Pool)");
    command("string [str] search_string", "find \"search_string\" in the strings of APK");
    command("interesting_strings", "interesting/suspicious strings from the APK file");

    println!();
    command("language [lang]", "print a language used to write the application");

    println!();
    command("cls [clr]", "clear screen");
    println!("{}", "\nexit/quit\n".bright_green());
}

pub(crate) fn manifest(apk: &Apk) {
    banner("----------- BEGIN -----------");
    println!("{}", apk.manifest_xml());
    banner("----------- EOF -----------");
}

pub(crate) fn is_debuggable(apk: &Apk) {
    if apk.is_debuggable() {
        println!("{}", "Yes".bright_green());
    } else {
        println!("{}", "No".bright_red());
    }
}

fn dump_components(components: &[Component]) {
    for component in components {
        println!("\t{}", component.name.green());
        if !component.intents.is_empty() {
            println!("\t\t{}", "Intents:".bright_black());
            for intent in &component.intents {
                println!("\t\t{}", intent);
            }
        }
    }
}

pub(crate) fn entry_points(apk: &Apk, extended: bool) {
    let manifest = apk.manifest();

    if let Some(application) = &manifest.application_class {
        println!("{}", "Application class name:".white());
        item(application);
    }

    if let Some(main) = manifest.main_activities().next() {
        println!("{}", "Main activity:".white());
        item(&main.name);
    }

    if !extended {
        return;
    }

    if !manifest.activities.is_empty() {
        println!("{}", "Activities:".white());
        dump_components(&manifest.activities);
    }
    if !manifest.services.is_empty() {
        println!("{}", "Services:".white());
        dump_components(&manifest.services);
    }
    if !manifest.receivers.is_empty() {
        println!("{}", "Receivers:".white());
        dump_components(&manifest.receivers);
    }
}

pub(crate) fn permissions(apk: &Apk) {
    let permissions = &apk.manifest().permissions;
    if permissions.is_empty() {
        return;
    }

    group_header("Permissions:");
    for permission in permissions {
        item(permission);
    }
}

fn component_names(title: &str, components: &[Component]) {
    if components.is_empty() {
        return;
    }

    group_header(title);
    for component in components {
        item(&component.name);
    }
}

pub(crate) fn activities(apk: &Apk) {
    component_names("Activities:", &apk.manifest().activities);
}

pub(crate) fn services(apk: &Apk) {
    component_names("Services:", &apk.manifest().services);
}

pub(crate) fn receivers(apk: &Apk) {
    component_names("Receivers:", &apk.manifest().receivers);
}

pub(crate) fn classes(apk: &Apk) {
    for (name, dex) in apk.images() {
        let classes = dex.classes();
        if classes.is_empty() {
            continue;
        }

        group_header(&format!("DEX file: {}", name));
        for class in classes {
            item(&class);
        }
    }
}

pub(crate) fn class_info(apk: &Apk, class_path: &str) {
    println!("{}", format!("Class: {}", class_path).white());

    let mut found = false;
    for (name, dex) in apk.images() {
        let methods = match dex.class_methods(class_path) {
            Ok(methods) => methods,
            Err(err) => {
                negative(&format!("{}: {}", name, err));
                continue;
            }
        };
        if methods.is_empty() {
            continue;
        }

        group_header(&format!("DEX file: {}", name));
        for (flags, method) in methods {
            print!("\t{}", flags.modifiers().bright_black());
            println!("{}", method.green());
            found = true;
        }
    }

    if !found {
        negative("Failed to locate a class");
    }
}

pub(crate) fn find_class(apk: &Apk, pattern: &str) {
    for (name, dex) in apk.images() {
        for class in dex.classes() {
            if patterns::find_case_insensitive(&class, pattern).is_some() {
                group_header(&format!("DEX file: {}", name));
                item(&class);
            }
        }
    }
}

pub(crate) fn methods(apk: &Apk) {
    for (name, dex) in apk.images() {
        let methods = match dex.methods() {
            Ok(methods) => methods,
            Err(err) => {
                negative(&format!("{}: {}", name, err));
                continue;
            }
        };
        if methods.is_empty() {
            continue;
        }

        group_header(&format!("DEX file: {}", name));
        for (class, method) in methods {
            print!("{}", format!("{}.", class).bright_black());
            println!("{}", method.green());
        }
    }
}

pub(crate) fn find_method(apk: &Apk, pattern: &str) {
    for (name, dex) in apk.images() {
        let methods = match dex.methods() {
            Ok(methods) => methods,
            Err(err) => {
                negative(&format!("{}: {}", name, err));
                continue;
            }
        };

        for (class, method) in methods {
            if patterns::find_case_insensitive(&method, pattern).is_some() {
                group_header(&format!("DEX file: {}", name));
                print!("{}", format!("{}.", class).bright_black());
                println!("{}", method.green());
            }
        }
    }
}

pub(crate) fn disassemble(apk: &Apk, method_path: &str) {
    let stdout = io::stdout();
    let mut sink = stdout.lock();

    match apk.disassemble(method_path, &mut sink) {
        Ok(true) => {
            let _ = sink.flush();
        }
        Ok(false) => negative(&format!("Failed to locate method: {}", method_path)),
        Err(err) => negative(&format!("{}: {}", method_path, err)),
    }
}

pub(crate) fn certificate(apk: &Apk) {
    match apk.certificate() {
        Some(certificate) => {
            banner("----------- BEGIN -----------");
            println!("{}", certificate.text());
            banner("----------- EOF -----------");
        }
        None => negative("No signing certificate found"),
    }
}

pub(crate) fn creation_date(apk: &Apk) {
    match apk.certificate() {
        Some(certificate) => println!("{}", certificate.not_before()),
        None => negative("No signing certificate found"),
    }
}

pub(crate) fn revoke_date(apk: &Apk) {
    match apk.certificate() {
        Some(certificate) => println!("{}", certificate.not_after()),
        None => negative("No signing certificate found"),
    }
}

pub(crate) fn libs(apk: &Apk) {
    let libs = apk.libs();
    if libs.is_empty() {
        return;
    }

    group_header("Libs:");
    for lib in libs {
        item(&lib);
    }
}

pub(crate) fn dump_libs(apk: &Apk, target: Option<&str>) {
    match apk.extract_libs(target) {
        Ok(written) if written.is_empty() => negative("No matching lib files"),
        Ok(written) => {
            for path in written {
                println!("{}", format!("unpacked lib: {}", path.display()).green());
            }
        }
        Err(err) => negative(&format!("Failed to unpack libs: {}", err)),
    }
}

pub(crate) fn libs_hash(apk: &Apk) {
    match apk.libs_hash() {
        Ok(hashes) => {
            for (name, digest) in hashes {
                print!("{}", format!("{}: ", name).green());
                println!("{}", digest.bright_black());
            }
        }
        Err(err) => negative(&format!("Failed to hash libs: {}", err)),
    }
}

pub(crate) fn strings(apk: &Apk) {
    for (name, dex) in apk.images() {
        let strings = match dex.strings() {
            Ok(strings) => strings,
            Err(err) => {
                negative(&format!("{}: {}", name, err));
                continue;
            }
        };
        if strings.is_empty() {
            continue;
        }

        group_header(&format!("DEX file: {}", name));
        for string in strings {
            item(&string);
        }
    }
}

pub(crate) fn interesting_strings(apk: &Apk) {
    let mut urls = Vec::new();
    let mut emails = Vec::new();

    for (name, dex) in apk.images() {
        let strings = match dex.strings() {
            Ok(strings) => strings,
            Err(err) => {
                negative(&format!("{}: {}", name, err));
                continue;
            }
        };

        for string in strings {
            if patterns::is_url(&string) {
                urls.push(string.clone());
            }
            if patterns::is_email(&string) {
                emails.push(string);
            }
        }
    }

    if !urls.is_empty() {
        group_header("URLs:");
        for url in &urls {
            item(url);
        }
    }

    if !emails.is_empty() {
        group_header("e-Mails:");
        for email in &emails {
            item(email);
        }
    }
}

pub(crate) fn search_string(apk: &Apk, pattern: &str) {
    for (name, dex) in apk.images() {
        let strings = match dex.strings() {
            Ok(strings) => strings,
            Err(err) => {
                negative(&format!("{}: {}", name, err));
                continue;
            }
        };

        for string in strings {
            if patterns::find_case_insensitive(&string, pattern).is_some() {
                print!("{}", format!("{}: ", name).bright_black());
                println!("{}", string.green());
            }
        }
    }
}

pub(crate) fn language(apk: &Apk) {
    let language = apk.language();
    let colored = match language {
        "Kotlin" => language.cyan(),
        ".NET (Xamarin)" => language.blue(),
        _ => language.bright_red(),
    };
    println!("{}", colored);
}
